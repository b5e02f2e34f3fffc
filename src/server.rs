use anyhow::anyhow;
use forgehook::{BoxError, Driver, Error, Webhook, MAX_PAYLOAD_SIZE};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    routes,
    serde::json::Json,
    Build, Data, Request, Rocket, State,
};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, trace, warn};

use crate::config::ForgehookConfig;

pub struct EventSender(pub UnboundedSender<Event>);

/// An authenticated event, as forwarded to the emitter.
#[derive(Debug, Serialize)]
pub struct Event {
    pub driver: Driver,
    pub event: Webhook,
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    kind: &'static str,
    repository: String,
}

pub fn rocket(config: ForgehookConfig, sender: EventSender) -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![webhook])
        .manage(config)
        .manage(sender)
}

/// A raw delivery: every header, the query string, and the body.
pub struct Delivery(pub forgehook::Request);

const LIMIT: ByteUnit = ByteUnit::Byte(MAX_PAYLOAD_SIZE as u64);

#[rocket::async_trait]
impl<'r> FromData<'r> for Delivery {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on webhook endpoint: {}", request.uri());

        let body = match data.open(LIMIT).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                trace!("payload was too big");
                return Outcome::Error((Status::PayloadTooLarge, anyhow!("data limit exceeded")));
            }
            Err(e) => return Outcome::Error((Status::BadRequest, e.into())),
        };

        let mut delivery = match forgehook::Request::new(body) {
            Ok(delivery) => delivery,
            Err(e) => return Outcome::Error((Status::PayloadTooLarge, e.into())),
        };
        for header in request.headers().iter() {
            delivery = delivery.with_header(header.name().as_str(), header.value());
        }
        if let Some(query) = request.uri().query() {
            delivery = delivery.with_query(query.as_str());
        }

        Outcome::Success(Delivery(delivery))
    }
}

#[rocket::post("/api/webhooks/<driver>", data = "<delivery>")]
pub fn webhook(
    driver: &str,
    delivery: Delivery,
    config: &State<ForgehookConfig>,
    sender: &State<EventSender>,
) -> Result<Json<Accepted>, Status> {
    let driver: Driver = match driver.parse() {
        Ok(driver) => driver,
        Err(e) => {
            debug!("{}", e);
            return Err(Status::NotFound);
        }
    };

    let resolver = |webhook: &Webhook| Ok::<_, BoxError>(config.secret_for(driver, webhook));
    let webhook = forgehook::parse(driver, &delivery.0, &resolver).map_err(|e| {
        let status = status(&e);
        if status == Status::InternalServerError {
            error!("couldn't handle {} webhook: {}", driver, e);
        } else {
            warn!("rejected {} webhook: {}", driver, e);
        }
        status
    })?;

    info!(
        "received {} event on {} from {}",
        webhook.kind(),
        webhook.repository().full_name(),
        driver
    );
    let accepted = Accepted {
        kind: webhook.kind(),
        repository: webhook.repository().full_name(),
    };

    if sender
        .0
        .send(Event {
            driver,
            event: webhook,
        })
        .is_err()
    {
        error!("event receiver is gone");
        return Err(Status::InternalServerError);
    }

    Ok(Json(accepted))
}

fn status(err: &Error) -> Status {
    match err {
        Error::UnknownWebhook { .. } | Error::MalformedPayload(_) | Error::Io(_) => {
            Status::BadRequest
        }
        Error::SignatureInvalid { .. } => Status::Unauthorized,
        Error::PayloadTooLarge { .. } => Status::PayloadTooLarge,
        Error::Unsupported { .. } => Status::NotImplemented,
        Error::UnknownDriver { .. } => Status::NotFound,
        Error::SecretResolution { .. } | Error::InvalidUrl(_) => Status::InternalServerError,
    }
}
