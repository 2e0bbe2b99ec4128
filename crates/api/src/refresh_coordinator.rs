use crate::{
    refresh::{
        RefreshEndedEventUseCase, RefreshError, RefreshEventsUseCase, RefreshReport, RefreshState,
    },
    shared::usecase::execute,
};
use countdown_infra::CountdownContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast::error::RecvError, mpsc, oneshot, watch};
use tokio::time::{interval, sleep};
use tracing::{info, warn};

type RefreshResult = Result<RefreshReport, RefreshError>;

struct RefreshRequest {
    done: Option<oneshot::Sender<RefreshResult>>,
}

/// Entry point to the bulk refresh queue. Requests are handled one at a
/// time in the order they arrived.
#[derive(Clone)]
pub struct RefreshHandle {
    queue: mpsc::UnboundedSender<RefreshRequest>,
    state: watch::Receiver<RefreshState>,
}

impl RefreshHandle {
    /// Queues a refresh without waiting for it. Returns false when the worker has stopped.
    pub fn request_refresh(&self) -> bool {
        self.queue.send(RefreshRequest { done: None }).is_ok()
    }

    /// Queues a refresh and waits for its report
    pub async fn refresh(&self) -> RefreshResult {
        let (done, report) = oneshot::channel();
        self.queue
            .send(RefreshRequest { done: Some(done) })
            .map_err(|_| RefreshError::Stopped)?;
        report.await.map_err(|_| RefreshError::Stopped)?
    }

    pub fn state(&self) -> watch::Receiver<RefreshState> {
        self.state.clone()
    }
}

pub fn get_start_delay(now_ts: i64, secs_before_min: u64) -> u64 {
    let secs_to_next_minute = 60 - (now_ts / 1000).rem_euclid(60) as u64;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Starts every task that keeps events refreshed
pub fn start_refresh_coordinator(ctx: CountdownContext) -> RefreshHandle {
    let handle = start_refresh_worker(ctx.clone());
    start_remote_change_listener(ctx.clone(), handle.clone());
    start_ended_event_listener(ctx.clone(), handle.clone());
    start_refresh_job_scheduler(ctx, handle.clone());
    handle
}

/// The single worker draining the bulk refresh queue
pub fn start_refresh_worker(ctx: CountdownContext) -> RefreshHandle {
    let (queue, mut requests) = mpsc::unbounded_channel::<RefreshRequest>();
    let (state, state_receiver) = watch::channel(RefreshState::Idle);
    let state = Arc::new(state);

    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let usecase = RefreshEventsUseCase {
                state: Some(state.clone()),
            };
            let res = execute(usecase, &ctx).await;
            state.send_replace(RefreshState::Idle);
            if let Some(done) = request.done {
                // The requester may have given up waiting
                let _ = done.send(res);
            }
        }
    });

    RefreshHandle {
        queue,
        state: state_receiver,
    }
}

/// Queues a bulk refresh whenever another writer changed the store
pub fn start_remote_change_listener(ctx: CountdownContext, handle: RefreshHandle) {
    let mut remote_changes = ctx.store.remote_changes();
    tokio::spawn(async move {
        while remote_changes.recv().await.is_some() {
            if !handle.request_refresh() {
                break;
            }
        }
    });
}

/// Refreshes every ended event on its own task, independent of the bulk queue
pub fn start_ended_event_listener(ctx: CountdownContext, handle: RefreshHandle) {
    let mut ended_signals = ctx.store.ended_signals();
    tokio::spawn(async move {
        loop {
            match ended_signals.recv().await {
                Ok(ended) => {
                    let ctx = ctx.clone();
                    tokio::spawn(async move {
                        let usecase = RefreshEndedEventUseCase {
                            event_id: ended.event_id,
                        };
                        let _ = execute(usecase, &ctx).await;
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Missed {} ended events, falling back to a bulk refresh",
                        skipped
                    );
                    handle.request_refresh();
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Periodic sweep so that events overdue by several periods keep advancing
pub fn start_refresh_job_scheduler(ctx: CountdownContext, handle: RefreshHandle) {
    let interval_secs = ctx.config.refresh_interval_secs;
    if interval_secs == 0 {
        info!("Periodic refresh of events is disabled");
        return;
    }

    tokio::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now, 0);
        sleep(Duration::from_secs(secs_to_next_run)).await;

        let mut refresh_interval = interval(Duration::from_secs(interval_secs));
        loop {
            refresh_interval.tick().await;
            if !handle.request_refresh() {
                break;
            }
        }
    });
}
