// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed state store handlers.

use crate::lifecycle::MasterCtx;
use sloth_wire::{KvItem, KvRequest, Response};

pub(super) fn handle(ctx: &MasterCtx, request: KvRequest) -> Response {
    let kv = &ctx.kv;
    match request {
        KvRequest::List { prefix } => Response::KvItems {
            items: kv
                .entries(&prefix)
                .into_iter()
                .map(|(key, entry)| KvItem {
                    key,
                    value: entry.value,
                    created_at: entry.created_at,
                    updated_at: entry.updated_at,
                })
                .collect(),
        },
        KvRequest::Get { key } => match kv.entry(&key) {
            Ok(entry) => Response::KvValue {
                item: Box::new(KvItem {
                    key,
                    value: entry.value,
                    created_at: entry.created_at,
                    updated_at: entry.updated_at,
                }),
            },
            Err(e) => Response::error(e),
        },
        KvRequest::Set { key, value } => match kv.set(&key, &value) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        KvRequest::Delete { key } => match kv.delete(&key) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        KvRequest::Clear { prefix } => {
            let keys: Vec<String> = kv.list(&prefix).into_keys().collect();
            let mut removed = 0u64;
            for key in keys {
                match kv.delete(&key) {
                    Ok(()) => removed += 1,
                    Err(e) => return Response::error(e),
                }
            }
            Response::Removed { count: removed }
        }
        KvRequest::Stats => {
            let keys = kv.list("").len() as u64;
            Response::KvStats {
                keys,
                locks: kv.lock_count() as u64,
            }
        }
    }
}
