// src/app/fetch.rs
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use tracing::debug;

use super::catalog::{self, CatalogSource};
use super::types::{FetchMsg, FetchRequest, MediaKind};

/// Runs catalog requests on background threads and hands the results back
/// through a channel the UI drains once per frame.
pub struct FetchWorker {
    source: Arc<dyn CatalogSource>,
    page_cap: u32,
    tx: Sender<FetchMsg>,
    rx: Receiver<FetchMsg>,
}

impl FetchWorker {
    pub fn new(source: Arc<dyn CatalogSource>, page_cap: u32) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            page_cap,
            tx,
            rx,
        }
    }

    pub fn spawn(&self, kind: MediaKind, generation: u64, request: FetchRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let page_cap = self.page_cap;

        std::thread::spawn(move || {
            let result = match &request {
                FetchRequest::Collection(c) => {
                    catalog::fetch_collection(&*source, kind, *c, page_cap)
                }
                FetchRequest::Search(q) => catalog::search(&*source, kind, q),
            };
            let _ = tx.send(FetchMsg {
                kind,
                generation,
                request,
                result,
            });
        });
    }

    /// Drain up to `max` finished requests without blocking.
    pub fn poll(&self, max: usize) -> Vec<FetchMsg> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.rx.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty) => break,
                // We hold a sender ourselves, so this cannot happen.
                Err(TryRecvError::Disconnected) => break,
            }
        }
        if !out.is_empty() {
            debug!("drained {} fetch result(s)", out.len());
        }
        out
    }
}
