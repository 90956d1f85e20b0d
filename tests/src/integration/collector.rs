//! # Mock Collector
//!
//! A `Transport` that plays the remote collector: it opens each envelope with
//! the recipient keys, checks that the identifier matches the plaintext,
//! deduplicates by identifier and answers with the collector's JSON shape.
//!
//! Faults can be queued to exercise the orchestrator's response handling.

use async_trait::async_trait;
use parking_lot::Mutex;
use qs_submission::{
    generate_identifier, open_envelope, CanonicalPayload, Envelope, OutboundSubmission,
    RequestIdentifier, Transport, TransportError, TransportResponse,
};
use serde_json::{json, Value};
use shared_crypto::{MlKemKeyPair, X25519KeyPair};
use std::collections::{HashMap, VecDeque};

/// Scripted deviation from normal processing.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Answer with this status and body without processing.
    Respond(u16, Value),
    /// Process the submission, then lose the response.
    LoseResponse,
    /// Fail before the collector sees anything.
    Unreachable,
}

/// A submission the collector opened and stored.
#[derive(Debug, Clone)]
pub struct Received {
    pub id: RequestIdentifier,
    pub pqc_used: bool,
    pub suite: String,
    pub payload: Value,
}

/// In-process collector.
pub struct MockCollector {
    classical: X25519KeyPair,
    strong: Option<MlKemKeyPair>,
    faults: Mutex<VecDeque<Fault>>,
    stored: Mutex<HashMap<String, Received>>,
    requests: Mutex<usize>,
}

impl MockCollector {
    /// Collector with a classical key and, optionally, an ML-KEM-768 key.
    pub fn new(with_strong_key: bool) -> Self {
        Self {
            classical: X25519KeyPair::generate(),
            strong: with_strong_key.then(|| MlKemKeyPair::generate().expect("ML-KEM keygen")),
            faults: Mutex::new(VecDeque::new()),
            stored: Mutex::new(HashMap::new()),
            requests: Mutex::new(0),
        }
    }

    /// Hex public keys as they appear in the submission config.
    pub fn classical_public_hex(&self) -> String {
        hex::encode(self.classical.public_bytes())
    }

    pub fn strong_public_hex(&self) -> Option<String> {
        self.strong.as_ref().map(|k| hex::encode(k.public_bytes()))
    }

    /// Queue a fault for the next request.
    pub fn inject(&self, fault: Fault) {
        self.faults.lock().push_back(fault);
    }

    /// Requests that reached the transport, faults included.
    pub fn request_count(&self) -> usize {
        *self.requests.lock()
    }

    /// Distinct stored submissions.
    pub fn stored(&self) -> Vec<Received> {
        self.stored.lock().values().cloned().collect()
    }

    fn process(&self, body: &str) -> TransportResponse {
        let outbound: OutboundSubmission = match serde_json::from_str(body) {
            Ok(outbound) => outbound,
            Err(e) => return reject(&format!("bad request: {e}")),
        };
        let envelope = match Envelope::from_json(&outbound.encrypted) {
            Ok(envelope) => envelope,
            Err(e) => return reject(&e.to_string()),
        };
        let plaintext = match open_envelope(&envelope, &self.classical, self.strong.as_ref()) {
            Ok(plaintext) => plaintext,
            Err(e) => return reject(&format!("cannot open envelope: {e}")),
        };
        let payload: Value = match serde_json::from_slice(&plaintext) {
            Ok(payload) => payload,
            Err(e) => return reject(&format!("plaintext is not JSON: {e}")),
        };

        let expected = generate_identifier(&CanonicalPayload::new(payload.clone()));
        if expected != outbound.id {
            return reject("identifier does not match payload");
        }

        let mut stored = self.stored.lock();
        let status = if stored.contains_key(outbound.id.as_str()) {
            "duplicate"
        } else {
            stored.insert(
                outbound.id.as_str().to_string(),
                Received {
                    id: outbound.id.clone(),
                    pqc_used: outbound.pqc_used,
                    suite: envelope.suite.as_str().to_string(),
                    payload,
                },
            );
            "created"
        };

        TransportResponse::new(
            if status == "created" { 201 } else { 200 },
            json!({"ok": true, "id": outbound.id.as_str(), "status": status}),
        )
    }
}

fn reject(message: &str) -> TransportResponse {
    TransportResponse::new(400, json!({"ok": false, "error": message}))
}

#[async_trait]
impl Transport for MockCollector {
    async fn send(&self, _endpoint: &str, body: String) -> Result<TransportResponse, TransportError> {
        *self.requests.lock() += 1;

        match self.faults.lock().pop_front() {
            Some(Fault::Respond(status, body)) => return Ok(TransportResponse::new(status, body)),
            Some(Fault::Unreachable) => {
                return Err(TransportError::Network("collector unreachable".into()))
            }
            Some(Fault::LoseResponse) => {
                self.process(&body);
                return Err(TransportError::Timeout);
            }
            None => {}
        }

        Ok(self.process(&body))
    }
}
