use anyhow::Result;
use bucket::Buckets;
use simplelog::{debug, info, warn};

use crate::{
    config::RangeRule,
    network::payload::{PostmarkRequest, PostmarkResponse},
};

use super::store::PostmarkStore;

pub mod bucket;

/// Applies the assignment policy on top of the buckets and keeps the store
/// in sync with them.
pub struct PostmarkManager<S> {
    buckets: Buckets,
    store: S,
    configured: bool,
}

impl<S: PostmarkStore> PostmarkManager<S> {
    pub fn init(store: S) -> Self {
        Self {
            buckets: Buckets::default(),
            store,
            configured: false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the buckets and replays every stored record into them.
    ///
    /// Records that no longer fit are deleted from the store; their device
    /// ids are returned. If the rules are invalid the current buckets stay.
    pub fn reload(&mut self, rules: &[RangeRule]) -> Result<Vec<String>> {
        let mut buckets = Buckets::new(rules)?;
        if buckets.is_empty() {
            warn!("Configuration has no buckets, no device will get a postmark");
        }

        let mut records = self.store.records()?;
        records.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut dropped = Vec::new();
        for (device, postmark) in records {
            if buckets.restore(&device, postmark) {
                debug!("Restored postmark {} for {}", postmark, device);
            } else {
                warn!(
                    "Stored postmark {} of {} does not fit the new configuration, dropping it",
                    postmark,
                    device
                );
                dropped.push((device, postmark));
            }
        }

        // stale records leave the store before the new buckets go live
        for (index, (device, _)) in dropped.iter().enumerate() {
            if let Err(error) = self.store.remove(device) {
                self.readd(&dropped[..index]);
                return Err(error.context(
                    "Failed to drop stale postmarks, keeping the current configuration",
                ));
            }
        }

        self.buckets = buckets;
        self.configured = true;
        for bucket in self.buckets.iter() {
            let rule = bucket.rule();
            info!(
                "Bucket {} [{}, {}] has {} free postmarks",
                rule.regex,
                rule.from,
                rule.to,
                bucket.allocator().free_capacity()
            );
        }

        Ok(dropped.into_iter().map(|(device, _)| device).collect())
    }

    fn readd(&mut self, records: &[(String, u32)]) {
        for (device, postmark) in records {
            if let Err(error) = self.store.upsert(device, *postmark) {
                warn!("Failed to restore stored postmark {} of {}: {}", postmark, device, error);
            }
        }
    }

    /// Returns `None` for requests that are dropped without an answer.
    pub fn assign(&mut self, request: &PostmarkRequest) -> Result<Option<PostmarkResponse>> {
        let device = request.dev_id.as_str();
        if device.is_empty() {
            debug!("Dropping postmark request without device id");
            return Ok(None);
        }

        let postmark = match (self.store.lookup(device)?, request.requested) {
            (Some(current), Some(requested)) if requested != current => {
                self.reassign(device, current, requested)?
            }
            (Some(current), _) => Some(current),
            (None, requested) => {
                let postmark = self.buckets.assign(device, requested);
                if let Some(postmark) = postmark {
                    if self.store.upsert(device, postmark)? {
                        debug!("Stored postmark {} for new device {}", postmark, device);
                    }
                }
                postmark
            }
        };

        match postmark {
            Some(postmark) => info!("Postmark {} belongs to {}", postmark, device),
            None => warn!("No bucket can serve device {}", device),
        }
        Ok(Some(PostmarkResponse {
            dev_id: device.to_string(),
            pm: postmark,
        }))
    }

    fn reassign(&mut self, device: &str, current: u32, requested: u32) -> Result<Option<u32>> {
        debug!("{} asks to move from postmark {} to {}", device, current, requested);
        self.buckets.release(current);

        if let Some(postmark) = self.buckets.assign(device, Some(requested)) {
            if !self.store.upsert(device, postmark)? {
                debug!("{} could not move and keeps postmark {}", device, postmark);
            }
            return Ok(Some(postmark));
        }

        if self.buckets.restore(device, current) {
            Ok(Some(current))
        } else {
            self.store.remove(device)?;
            Ok(None)
        }
    }
}
