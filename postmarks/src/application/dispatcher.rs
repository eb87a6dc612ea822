use anyhow::Result;
use serde::Serialize;
use simplelog::{debug, info, warn};

use crate::network::{
    frame::{Frame, RETAINED_TTL},
    payload::{ConfigPayload, PostmarkRequest, PostmarkResponse},
    subject::{self, Subject},
    Message,
};

use super::{
    postmark::{bucket::ConfigError, PostmarkManager},
    store::PostmarkStore,
};

/// Handles one bus message and returns the frames to publish in response.
pub fn dispatch<S: PostmarkStore>(
    manager: &mut PostmarkManager<S>,
    message: &Message,
) -> Result<Vec<Frame>> {
    debug!("Received message on {}", message.subject);

    if Subject::new(subject::CONFIG).matches(&message.subject) {
        configure(manager, &message.payload)
    } else if Subject::new(subject::POSTMARK_REQUEST).matches(&message.subject) {
        request(manager, &message.payload)
    } else {
        warn!("Received unknown message on {}", message.subject);
        Ok(Vec::new())
    }
}

fn configure<S: PostmarkStore>(
    manager: &mut PostmarkManager<S>,
    payload: &str,
) -> Result<Vec<Frame>> {
    let rules = match serde_json::from_str::<ConfigPayload>(payload) {
        Ok(config) => config.ranges,
        Err(error) => {
            return Ok(vec![config_error(&anyhow::Error::from(ConfigError::from(error)))])
        }
    };

    match manager.reload(&rules) {
        Ok(dropped) => {
            info!("Applied configuration with {} buckets", rules.len());
            dropped
                .into_iter()
                .map(|device| response(&PostmarkResponse::not_present(device)))
                .collect()
        }
        Err(error) => Ok(vec![config_error(&error)]),
    }
}

fn request<S: PostmarkStore>(
    manager: &mut PostmarkManager<S>,
    payload: &str,
) -> Result<Vec<Frame>> {
    if !manager.is_configured() {
        debug!("Ignoring postmark request, no configuration received yet");
        return Ok(Vec::new());
    }

    let request = match serde_json::from_str::<PostmarkRequest>(payload) {
        Ok(request) => request,
        Err(error) => {
            warn!("Received malformed postmark request: {}", error);
            return Ok(vec![Frame::publish(
                subject::REQUEST_ERROR,
                error.to_string(),
                0,
            )]);
        }
    };

    match manager.assign(&request)? {
        Some(answer) => Ok(vec![response(&answer)?]),
        None => Ok(Vec::new()),
    }
}

fn response(answer: &PostmarkResponse) -> Result<Frame> {
    Ok(Frame::publish(
        subject::POSTMARK_RESPONSE,
        encode(answer)?,
        RETAINED_TTL,
    ))
}

fn config_error(error: &anyhow::Error) -> Frame {
    warn!("Rejected configuration: {}", error);
    Frame::publish(subject::CONFIG_ERROR, error.to_string(), 0)
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
