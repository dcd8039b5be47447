use crate::capture::CapturedImage;
use crate::recognizer::PlateReader;
use crate::session::{AppState, ScanOutcome, Session};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

const INDEX_HTML: &str = include_str!("../static/index.html");

const ERR_NO_API_KEY: &str = "API_KEY environment variable is not set on the server.";
const ERR_BAD_IMAGE: &str = "imageDataUrl is not a valid base64 JPEG image.";
const ERR_MISSING_BODY: &str = "imageDataUrl is required.";
const ERR_MODEL: &str = "An error occurred while processing the image with the AI model.";

/// Shared handler context. `reader` is None when the server came up without
/// an API credential; the recognition endpoints answer 500 until one is set.
#[derive(Clone)]
pub struct AppContext {
    pub reader: Option<Arc<dyn PlateReader>>,
}

#[derive(Debug, Deserialize)]
struct RecognizeRequest {
    #[serde(rename = "imageDataUrl")]
    image_data_url: String,
}

#[derive(Serialize)]
struct RecognizeResponse<'a> {
    plate: &'a str,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

pub fn routes(
    ctx: AppContext,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let ctx = warp::any().map(move || ctx.clone());

    // Paths are matched before methods so an unknown path stays a 404 and a
    // wrong method on a known path becomes a 405.
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let recognize = warp::path!("api" / "recognize")
        .and(warp::post())
        .and(warp::body::json())
        .and(ctx.clone())
        .and_then(handle_recognize);

    let scan = warp::path!("api" / "scan")
        .and(warp::post())
        .and(warp::body::json())
        .and(ctx)
        .and_then(handle_scan);

    index.or(recognize).or(scan).recover(handle_rejection)
}

/// The server-mediated recognition exchange: forwards the frame to the model
/// and relays the raw uppercased answer, NOT_FOUND sentinel included.
async fn handle_recognize(
    request: RecognizeRequest,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    let reader = match ctx.reader {
        Some(reader) => reader,
        None => return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, ERR_NO_API_KEY)),
    };
    let image = match CapturedImage::from_data_url(&request.image_data_url) {
        Ok(image) => image,
        Err(e) => {
            debug!("Rejected capture payload: {}", e);
            return Ok(error_reply(StatusCode::BAD_REQUEST, ERR_BAD_IMAGE));
        }
    };
    match reader.raw_plate_text(&image).await {
        Ok(text) => Ok(json_reply(
            StatusCode::OK,
            &RecognizeResponse { plate: &text },
        )),
        Err(e) => {
            error!("Recognition request failed: {}", e);
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, ERR_MODEL))
        }
    }
}

/// Full pipeline for the embedded frontend: recognition, validation and the
/// mocked registry lookup in one exchange. The body carries a vehicle record
/// or an error message, never both.
async fn handle_scan(request: RecognizeRequest, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let reader = match ctx.reader {
        Some(reader) => reader,
        None => return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, ERR_NO_API_KEY)),
    };
    let image = match CapturedImage::from_data_url(&request.image_data_url) {
        Ok(image) => image,
        Err(e) => {
            debug!("Rejected capture payload: {}", e);
            return Ok(error_reply(StatusCode::BAD_REQUEST, ERR_BAD_IMAGE));
        }
    };

    let mut session = Session::new(reader);
    session.start_scan();
    let reply = match session.capture(image).await {
        AppState::Results {
            outcome: ScanOutcome::Vehicle(info),
            ..
        } => json_reply(StatusCode::OK, &serde_json::json!({ "vehicle": info })),
        AppState::Results { outcome, .. } => json_reply(
            StatusCode::OK,
            &serde_json::json!({ "error": outcome.error_message() }),
        ),
        // capture always lands in Results
        _ => error_reply(StatusCode::INTERNAL_SERVER_ERROR, ERR_MODEL),
    };
    Ok(reply)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, ERR_MISSING_BODY)
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    };
    Ok(error_reply(status, message))
}

fn error_reply(
    status: StatusCode,
    message: &str,
) -> warp::reply::WithStatus<warp::reply::Json> {
    json_reply(status, &ErrorResponse { error: message })
}

fn json_reply<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}
