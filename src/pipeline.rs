//! Pipeline orchestration.
//!
//! Wires the capture source, classifier, block set, resolver, and
//! attribution table together. One task reads frames from the capture
//! source in order; classification and table lookups run synchronously
//! on that stream. Only resolution leaves the hot path, as a spawned
//! task per blocked query whose completion writes the table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hickory_proto::op::Message;
use hickory_proto::serialize::binary::BinDecodable;
use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::attribution::AttributionTable;
use crate::blocklist::DomainBlockSet;
use crate::dns::ForwardResolver;
use crate::events::{Event, EventSink};
use crate::network::{classify, ClassifiedFrame, DecodeError, FrameCapture};

/// The traffic-attribution pipeline.
///
/// Generic over the resolver and sink so tests can drive it with mocks,
/// the same way the capture side is abstracted behind [`FrameCapture`].
pub struct AttributionPipeline<R, S>
where
    R: ForwardResolver,
    S: EventSink,
{
    block_set: Arc<DomainBlockSet>,
    resolver: R,
    sink: Arc<S>,
    table: Arc<AttributionTable>,
    running: Arc<AtomicBool>,
}

impl<R, S> AttributionPipeline<R, S>
where
    R: ForwardResolver,
    S: EventSink,
{
    pub fn new(block_set: DomainBlockSet, resolver: R, sink: S) -> Self {
        Self {
            block_set: Arc::new(block_set),
            resolver,
            sink: Arc::new(sink),
            table: Arc::new(AttributionTable::new()),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared handle to the attribution table.
    pub fn table(&self) -> Arc<AttributionTable> {
        Arc::clone(&self.table)
    }

    /// Spawn the blocking capture loop feeding the frame channel.
    ///
    /// The loop exits when the capture source ends, the channel closes,
    /// or [`shutdown`](Self::shutdown) flips the running flag; the
    /// capture handle is released when the task returns.
    pub fn spawn_capture<C>(&self, mut capture: C, tx: mpsc::Sender<Vec<u8>>) -> JoinHandle<()>
    where
        C: FrameCapture + 'static,
    {
        let running = Arc::clone(&self.running);
        tokio::task::spawn_blocking(move || {
            while running.load(Ordering::SeqCst) {
                let Some(frame) = capture.next_frame() else {
                    break;
                };
                if tx.blocking_send(frame).is_err() {
                    break;
                }
            }
            debug!("capture task terminated");
        })
    }

    /// Process frames from the channel until shutdown or channel end.
    ///
    /// Frames are handled in arrival order. On exit the pipeline shuts
    /// itself down, so a capture source running dry also clears state.
    pub async fn run(&self, mut frames: mpsc::Receiver<Vec<u8>>) {
        while let Some(frame) = frames.recv().await {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.handle_frame(&frame);
        }
        self.shutdown();
    }

    /// Stop the pipeline: no frames are processed after this returns,
    /// late resolution completions are discarded, and the attribution
    /// table is emptied. Safe to call any number of times; only the
    /// first call performs cleanup.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.table.clear();
            info!("pipeline stopped");
        }
    }

    /// Classify one frame and dispatch it.
    ///
    /// Every failure is per-frame: malformed input is counted and
    /// logged, never propagated.
    pub fn handle_frame(&self, frame: &[u8]) {
        counter!("tracelight_frames_total").increment(1);

        match classify(frame) {
            Ok(ClassifiedFrame::DnsQuery { source, payload }) => {
                self.handle_dns_query(source, &payload);
            }
            Ok(ClassifiedFrame::Traffic {
                source,
                destination,
                bytes,
                protocol,
            }) => {
                if let Some(domain) = self.table.lookup(destination) {
                    counter!("tracelight_traffic_attributed_total").increment(1);
                    debug!(%source, %destination, %domain, bytes, "attributed traffic");
                    self.sink
                        .publish(Event::traffic(source, destination, domain, bytes, protocol));
                }
            }
            // Out-of-scope traffic the capture filter let through.
            Err(DecodeError::NotIpv4(_)) => {}
            Err(err) => {
                counter!("tracelight_frames_dropped_total").increment(1);
                trace!(error = %err, "dropped undecodable frame");
            }
        }
    }

    fn handle_dns_query(&self, source: std::net::Ipv4Addr, payload: &[u8]) {
        // Not every datagram to port 53 is a well-formed query; skip
        // quietly, this is not a malformed-frame condition.
        let Ok(message) = Message::from_bytes(payload) else {
            trace!(%source, "undecodable DNS payload");
            return;
        };

        let Some(question) = message.queries().first() else {
            return;
        };

        let domain = question.name().to_utf8().to_lowercase();
        let domain = domain.trim_end_matches('.').to_string();

        if !self.block_set.is_blocked(&domain) {
            trace!(%domain, %source, "query allowed");
            return;
        }

        counter!("tracelight_blocked_queries_total").increment(1);
        info!(%domain, %source, "blocked domain queried");
        self.sink.publish(Event::blocked_query(domain.clone(), source));

        // Fire and forget: the packet path never waits on resolution.
        let _ = self.spawn_resolution(domain);
    }

    /// Resolve `domain` off the packet path and record the addresses.
    ///
    /// Completions arriving after shutdown are discarded so cleared
    /// state cannot be resurrected.
    fn spawn_resolution(&self, domain: String) -> JoinHandle<()> {
        let resolver = self.resolver.clone();
        let table = Arc::clone(&self.table);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            match resolver.resolve(&domain).await {
                Ok(addresses) if addresses.is_empty() => {
                    debug!(%domain, "resolution returned no addresses");
                }
                Ok(addresses) => {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    debug!(%domain, count = addresses.len(), "recording attribution");
                    for address in addresses {
                        table.record(address, domain.clone());
                    }
                }
                Err(err) => {
                    counter!("tracelight_resolutions_failed_total").increment(1);
                    warn!(%domain, error = %err, "resolution failed");
                }
            }
        })
    }
}
