//! Stack-frame filename rewriting.
//!
//! Source maps are uploaded once against `https://dynamichost/<file>`. Frames
//! reported from any deployed domain are rewritten to that placeholder host
//! before the item leaves the client, so the same upload resolves for every
//! environment.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_DOMAIN_SUFFIX: &str = "somdomain.io";
pub const PLACEHOLDER_HOST: &str = "dynamichost";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransformError {
    #[error("payload has no body object")]
    MissingBody,
    #[error("{0} is not an array of frames")]
    MalformedFrames(&'static str),
}

#[derive(Debug, Clone)]
pub struct FrameRewriter {
    pattern: Regex,
    placeholder_host: String,
}

impl Default for FrameRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN_SUFFIX, PLACEHOLDER_HOST)
    }
}

impl FrameRewriter {
    pub fn new(domain_suffix: &str, placeholder_host: &str) -> Self {
        let pattern = format!(
            r"^(https?)://[a-zA-Z0-9._-]+\.{}(.*)",
            regex::escape(domain_suffix)
        );
        Self {
            pattern: Regex::new(&pattern).expect("escaped domain suffix forms a valid pattern"),
            placeholder_host: placeholder_host.to_owned(),
        }
    }

    pub fn placeholder_host(&self) -> &str {
        &self.placeholder_host
    }

    /// Returns the placeholder-host form of `filename`, or `None` when it is not
    /// served from the deployed domain.
    pub fn rewrite(&self, filename: &str) -> Option<String> {
        let caps = self.pattern.captures(filename)?;
        Some(format!(
            "{}://{}{}",
            &caps[1],
            self.placeholder_host,
            caps.get(2).map_or("", |m| m.as_str())
        ))
    }

    /// Rewrites frame filenames in an item `data` object in place.
    ///
    /// Both `body.trace` and every entry of `body.trace_chain` are visited.
    /// Frames that do not match are left as they are.
    pub fn transform(&self, data: &mut Value) -> Result<usize, TransformError> {
        let body = data
            .get_mut("body")
            .and_then(Value::as_object_mut)
            .ok_or(TransformError::MissingBody)?;

        let mut rewritten = 0;
        if let Some(trace) = body.get_mut("trace") {
            rewritten += self.transform_trace(trace, "body.trace.frames")?;
        }
        if let Some(chain) = body.get_mut("trace_chain") {
            let chain = chain
                .as_array_mut()
                .ok_or(TransformError::MalformedFrames("body.trace_chain"))?;
            for trace in chain {
                rewritten += self.transform_trace(trace, "body.trace_chain[].frames")?;
            }
        }
        Ok(rewritten)
    }

    fn transform_trace(
        &self,
        trace: &mut Value,
        what: &'static str,
    ) -> Result<usize, TransformError> {
        let frames = match trace.get_mut("frames") {
            Some(Value::Null) | None => return Ok(0),
            Some(frames) => frames
                .as_array_mut()
                .ok_or(TransformError::MalformedFrames(what))?,
        };
        let mut rewritten = 0;
        for frame in frames {
            let filename = match frame.get_mut("filename") {
                Some(filename) => filename,
                None => continue,
            };
            if let Some(new_name) = filename.as_str().and_then(|f| self.rewrite(f)) {
                *filename = Value::String(new_name);
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}
