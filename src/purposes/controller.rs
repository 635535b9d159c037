use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use super::{BasicProofPurpose, ProofPurpose, DID_VERIFICATION_RELATIONSHIPS};
use crate::canonicalize::{FrameOptions, Framer};
use crate::context::{first_context, DID_CONTEXT_V1_URL, SECURITY_CONTEXT_URL};
use crate::error::Error;
use crate::loader::DocumentLoader;
use crate::proof::{Proof, ValidationResult, VerificationMethod};

/// A purpose whose verification method must be listed under the purpose's
/// term in its controller document.
///
/// The controller document is either supplied up front with
/// [`with_controller`](Self::with_controller) or dereferenced from the
/// verification method's `controller`. DID documents declaring the DID v1
/// context are read as they are; any other controller document is framed
/// through the configured [`Framer`] first.
#[derive(Clone)]
pub struct ControllerProofPurpose {
    base: BasicProofPurpose,
    controller: Option<Value>,
    framer: Option<Arc<dyn Framer>>,
}

impl ControllerProofPurpose {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            base: BasicProofPurpose::new(term),
            controller: None,
            framer: None,
        }
    }

    pub fn with_controller(mut self, controller: Value) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn with_framer(mut self, framer: Arc<dyn Framer>) -> Self {
        self.framer = Some(framer);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.base = self.base.with_date(date);
        self
    }

    pub fn with_max_timestamp_delta(mut self, delta: Duration) -> Self {
        self.base = self.base.with_max_timestamp_delta(delta);
        self
    }

    pub fn controller(&self) -> Option<&Value> {
        self.controller.as_ref()
    }

    fn term_defined_by_did_context(&self) -> bool {
        DID_VERIFICATION_RELATIONSHIPS
            .iter()
            .any(|term| *term == self.term())
    }

    async fn resolve_controller(
        &self,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> Result<Value, Error> {
        let controller_id = verification_method
            .controller_id()
            .ok_or_else(|| Error::MissingController(verification_method.id.clone()))?;
        let document = document_loader.load(controller_id).await?.into_json()?;

        let did_shaped = self.term_defined_by_did_context()
            && first_context(&document).and_then(Value::as_str) == Some(DID_CONTEXT_V1_URL);
        if did_shaped {
            return Ok(document);
        }

        let framer = self
            .framer
            .as_ref()
            .ok_or_else(|| Error::MissingFramer(controller_id.to_owned()))?;
        let term = self.term();
        let frame = json!({
            "@context": SECURITY_CONTEXT_URL,
            "id": controller_id,
            term: {
                "@embed": "@never",
                "id": verification_method.id,
            }
        });
        let options = FrameOptions {
            document_loader,
            compact_to_relative: false,
        };
        let framed = framer.frame(&document, &frame, options).await?;
        log::debug!("framed controller {controller_id}: matched={}", framed.is_some());
        Ok(framed.unwrap_or_else(|| json!({})))
    }

    pub(crate) async fn validate_controller(
        &self,
        proof: &Proof,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> Result<ValidationResult, Error> {
        self.base.validate_timestamp(proof)?;

        let controller = match &self.controller {
            Some(controller) => controller.clone(),
            None => {
                self.resolve_controller(verification_method, document_loader)
                    .await?
            }
        };

        let authorized = get_values(&controller, self.term())
            .iter()
            .any(|entry| references(entry, &verification_method.id));
        if !authorized {
            return Err(Error::NotAuthorized {
                method: verification_method.id.clone(),
                purpose: self.term().to_owned(),
            });
        }
        Ok(ValidationResult::with_controller(controller))
    }
}

#[async_trait]
impl ProofPurpose for ControllerProofPurpose {
    fn term(&self) -> &str {
        self.base.term()
    }

    async fn update(
        &self,
        proof: Proof,
        _document: &Value,
        _document_loader: &dyn DocumentLoader,
    ) -> Result<Proof, Error> {
        Ok(self.base.stamp(proof))
    }

    async fn validate(
        &self,
        proof: &Proof,
        verification_method: &VerificationMethod,
        document_loader: &dyn DocumentLoader,
    ) -> ValidationResult {
        self.validate_controller(proof, verification_method, document_loader)
            .await
            .into()
    }
}

/// Values of `property` as a list: absent is empty, a single value is a
/// one-element list.
fn get_values<'a>(document: &'a Value, property: &str) -> Vec<&'a Value> {
    match document.get(property) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values.iter().collect(),
        Some(value) => vec![value],
    }
}

fn references(entry: &Value, id: &str) -> bool {
    match entry {
        Value::String(s) => s == id,
        Value::Object(map) => map.get("id").and_then(Value::as_str) == Some(id),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{DisabledLoader, StaticDocumentLoader};
    use crate::purposes::ASSERTION_METHOD;

    const VM_ID: &str = "did:example:alice#key-1";

    fn verification_method() -> VerificationMethod {
        VerificationMethod::from_value(json!({
            "id": VM_ID,
            "type": "Multikey",
            "controller": "did:example:alice"
        }))
        .unwrap()
    }

    fn did_document(assertion: Value) -> Value {
        json!({
            "@context": [DID_CONTEXT_V1_URL],
            "id": "did:example:alice",
            "assertionMethod": assertion
        })
    }

    struct FixedFramer(Option<Value>);

    #[async_trait]
    impl Framer for FixedFramer {
        async fn frame(
            &self,
            input: &Value,
            frame: &Value,
            options: FrameOptions<'_>,
        ) -> Result<Option<Value>, Error> {
            assert_eq!(input["id"], "https://example.com/issuer");
            assert_eq!(frame["assertionMethod"]["@embed"], "@never");
            assert!(!options.compact_to_relative);
            Ok(self.0.clone())
        }
    }

    #[async_std::test]
    async fn did_controller_is_read_directly() {
        let loader = StaticDocumentLoader::new()
            .with_document("did:example:alice", did_document(json!([VM_ID])));
        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD);
        let result = purpose
            .validate(&Proof::new("X"), &verification_method(), &loader)
            .await;
        assert!(result.valid, "{:?}", result.error);
        assert_eq!(result.controller.unwrap()["id"], "did:example:alice");
    }

    #[async_std::test]
    async fn object_entries_match_by_id() {
        let loader = StaticDocumentLoader::new().with_document(
            "did:example:alice",
            did_document(json!({ "id": VM_ID, "type": "Multikey" })),
        );
        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD);
        let result = purpose
            .validate(&Proof::new("X"), &verification_method(), &loader)
            .await;
        assert!(result.valid);
    }

    #[async_std::test]
    async fn unlisted_method_is_not_authorized() {
        let loader = StaticDocumentLoader::new().with_document(
            "did:example:alice",
            did_document(json!(["did:example:alice#key-2"])),
        );
        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD);
        let result = purpose
            .validate(&Proof::new("X"), &verification_method(), &loader)
            .await;
        assert!(!result.valid);
        assert_eq!(
            result.error,
            Some(Error::NotAuthorized {
                method: VM_ID.into(),
                purpose: ASSERTION_METHOD.into()
            })
        );
    }

    #[async_std::test]
    async fn explicit_controller_skips_loading() {
        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD)
            .with_controller(did_document(json!(VM_ID)));
        let result = purpose
            .validate(&Proof::new("X"), &verification_method(), &DisabledLoader)
            .await;
        assert!(result.valid);
    }

    #[async_std::test]
    async fn other_controllers_are_framed() {
        let issuer = json!({
            "@context": SECURITY_CONTEXT_URL,
            "id": "https://example.com/issuer",
            "assertionMethod": VM_ID
        });
        let loader =
            StaticDocumentLoader::new().with_document("https://example.com/issuer", issuer.clone());
        let mut vm = verification_method();
        vm.controller = Some(crate::proof::ControllerRef::Id(
            "https://example.com/issuer".into(),
        ));

        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD);
        let result = purpose.validate(&Proof::new("X"), &vm, &loader).await;
        assert!(matches!(result.error, Some(Error::MissingFramer(_))));

        let purpose = purpose.clone().with_framer(Arc::new(FixedFramer(Some(issuer))));
        assert!(purpose.validate(&Proof::new("X"), &vm, &loader).await.valid);

        let purpose = purpose.with_framer(Arc::new(FixedFramer(None)));
        let result = purpose.validate(&Proof::new("X"), &vm, &loader).await;
        assert!(matches!(result.error, Some(Error::NotAuthorized { .. })));
    }

    /// Frames only what it is given, without loading anything.
    struct InputFramer;

    #[async_trait]
    impl Framer for InputFramer {
        async fn frame(
            &self,
            input: &Value,
            _frame: &Value,
            _options: FrameOptions<'_>,
        ) -> Result<Option<Value>, Error> {
            Ok(Some(input.clone()))
        }
    }

    #[async_std::test]
    async fn loaded_controller_document_is_framed() {
        let issuer = json!({
            "@context": SECURITY_CONTEXT_URL,
            "id": "https://example.com/issuer",
            "assertionMethod": [VM_ID]
        });
        let loader =
            StaticDocumentLoader::new().with_document("https://example.com/issuer", issuer.clone());
        let mut vm = verification_method();
        vm.controller = Some(crate::proof::ControllerRef::Id(
            "https://example.com/issuer".into(),
        ));

        let purpose =
            ControllerProofPurpose::new(ASSERTION_METHOD).with_framer(Arc::new(InputFramer));
        let result = purpose.validate(&Proof::new("X"), &vm, &loader).await;
        assert!(result.valid, "{:?}", result.error);
        assert_eq!(result.controller, Some(issuer));
    }

    #[async_std::test]
    async fn missing_controller() {
        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD);
        let result = purpose
            .validate(
                &Proof::new("X"),
                &VerificationMethod::new(VM_ID),
                &DisabledLoader,
            )
            .await;
        assert_eq!(result.error, Some(Error::MissingController(VM_ID.into())));
    }

    #[async_std::test]
    async fn timestamp_checked_first() {
        let purpose = ControllerProofPurpose::new(ASSERTION_METHOD)
            .with_max_timestamp_delta(Duration::seconds(1))
            .with_controller(did_document(json!(VM_ID)));
        let result = purpose
            .validate(&Proof::new("X"), &verification_method(), &DisabledLoader)
            .await;
        assert_eq!(result.error, Some(Error::TimestampOutOfRange));
    }
}
