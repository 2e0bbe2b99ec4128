use actix_web::{http::header, web, web::Bytes, HttpResponse};
use countdown_api_structs::get_event_changes::CHANGED_EVENT;
use countdown_infra::CountdownContext;
use futures::{stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::debug;

fn changed_frame() -> Bytes {
    Bytes::from(format!("event: {}\ndata: {{}}\n\n", CHANGED_EVENT))
}

/// Streams a server sent event for every change committed to the store,
/// by this server or by another writer
pub async fn get_event_changes_controller(ctx: web::Data<CountdownContext>) -> HttpResponse {
    let changes = BroadcastStream::new(ctx.store.changes()).map(|change| {
        if let Err(BroadcastStreamRecvError::Lagged(skipped)) = change {
            // A missed change still means the events must be queried again
            debug!("Change stream skipped {} notifications", skipped);
        }
        Ok::<_, Infallible>(changed_frame())
    });
    // Sent right away so that the client knows it is subscribed
    let connected = stream::once(async { Ok(Bytes::from_static(b": connected\n\n")) });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(connected.chain(changes))
}
