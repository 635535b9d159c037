use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Error;

/// Name of the document property holding the proof collection.
pub const PROOF_PROPERTY: &str = "proof";

const SIGNATURE_PROPERTIES: [&str; 3] = ["proofValue", "jws", "signatureValue"];

/// A proof object.
///
/// Well-known properties are decoded into typed fields when they have the
/// expected shape. Anything else, including a well-known property holding
/// an unexpected value such as an array `domain` or a `null`, stays as
/// written in `property_set`. Decoding only fails when `type` is not a
/// string, and encoding gives back every property that was decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proof {
    pub context: Option<Value>,
    pub type_: String,
    pub proof_purpose: Option<String>,
    pub cryptosuite: Option<String>,
    /// Kept as written so that a malformed timestamp can be reported as out
    /// of range instead of failing to decode the proof.
    pub created: Option<String>,
    pub verification_method: Option<VerificationMethodRef>,
    pub challenge: Option<String>,
    pub domain: Option<String>,
    pub proof_value: Option<String>,
    pub jws: Option<String>,
    pub signature_value: Option<String>,
    pub property_set: Map<String, Value>,
}

impl Proof {
    pub fn new(type_: &str) -> Self {
        Self {
            type_: type_.to_string(),
            ..Self::default()
        }
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(Value::Object(self.to_map()?))
    }

    pub fn verification_method_id(&self) -> Option<&str> {
        self.verification_method.as_ref().map(VerificationMethodRef::id)
    }

    /// A property as written, whether decoded into a typed field or not.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.to_map().ok()?.remove(name)
    }

    /// Proof options: the proof without any signature-bearing field, under
    /// `context` unless the proof declares its own.
    pub(crate) fn to_options(&self, context: Value) -> Result<Value, Error> {
        let mut options = Map::new();
        options.insert("@context".to_owned(), context);
        options.extend(self.to_map()?);
        for property in SIGNATURE_PROPERTIES {
            options.remove(property);
        }
        Ok(Value::Object(options))
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self, String> {
        let type_ = match map.remove("type") {
            Some(Value::String(type_)) => type_,
            Some(other) => return Err(format!("proof type must be a string, found {other}")),
            None => return Err("proof has no type".to_owned()),
        };
        let verification_method = match map.get("verificationMethod") {
            Some(value) => match VerificationMethodRef::deserialize(value) {
                Ok(vm) => {
                    map.remove("verificationMethod");
                    Some(vm)
                }
                Err(_) => None,
            },
            None => None,
        };
        Ok(Self {
            context: map.remove("@context"),
            type_,
            proof_purpose: take_string(&mut map, "proofPurpose"),
            cryptosuite: take_string(&mut map, "cryptosuite"),
            created: take_string(&mut map, "created"),
            verification_method,
            challenge: take_string(&mut map, "challenge"),
            domain: take_string(&mut map, "domain"),
            proof_value: take_string(&mut map, "proofValue"),
            jws: take_string(&mut map, "jws"),
            signature_value: take_string(&mut map, "signatureValue"),
            property_set: map,
        })
    }

    fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut map = self.property_set.clone();
        if let Some(context) = &self.context {
            map.insert("@context".to_owned(), context.clone());
        }
        map.insert("type".to_owned(), Value::String(self.type_.clone()));
        if let Some(vm) = &self.verification_method {
            map.insert("verificationMethod".to_owned(), serde_json::to_value(vm)?);
        }
        let strings = [
            ("proofPurpose", &self.proof_purpose),
            ("cryptosuite", &self.cryptosuite),
            ("created", &self.created),
            ("challenge", &self.challenge),
            ("domain", &self.domain),
            ("proofValue", &self.proof_value),
            ("jws", &self.jws),
            ("signatureValue", &self.signature_value),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                map.insert(name.to_owned(), Value::String(value.clone()));
            }
        }
        Ok(map)
    }
}

/// Removes `name` from `map` if it holds a string.
fn take_string(map: &mut Map<String, Value>, name: &str) -> Option<String> {
    if !matches!(map.get(name), Some(Value::String(_))) {
        return None;
    }
    match map.remove(name) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl Serialize for Proof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_map()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(D::Error::custom)
    }
}

/// A verification method, either by reference or embedded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum VerificationMethodRef {
    Id(String),
    Object(VerificationMethod),
}

impl VerificationMethodRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(vm) => &vm.id,
        }
    }
}

impl From<String> for VerificationMethodRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for VerificationMethodRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

/// A resolved verification method. Key material is left in `property_set`
/// for verifiers to interpret.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<Value>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

impl VerificationMethod {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            type_: None,
            controller: None,
            revoked: None,
            property_set: Map::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn controller_id(&self) -> Option<&str> {
        match self.controller.as_ref()? {
            ControllerRef::Id(id) => Some(id),
            ControllerRef::Object(doc) => doc.get("id").and_then(Value::as_str),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.property_set.get(name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ControllerRef {
    Id(String),
    Object(Map<String, Value>),
}

/// Outcome of a proof purpose check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub controller: Option<Value>,
    pub error: Option<Error>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub fn with_controller(controller: Value) -> Self {
        Self {
            valid: true,
            controller: Some(controller),
            error: None,
        }
    }

    pub fn invalid(error: Error) -> Self {
        Self {
            valid: false,
            controller: None,
            error: Some(error),
        }
    }
}

impl From<Result<ValidationResult, Error>> for ValidationResult {
    fn from(result: Result<ValidationResult, Error>) -> Self {
        result.unwrap_or_else(Self::invalid)
    }
}

/// Outcome of a suite's signature check on one proof.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationResult {
    pub verified: bool,
    pub verification_method: Option<VerificationMethod>,
    pub error: Option<Error>,
}

impl VerificationResult {
    pub fn success(verification_method: VerificationMethod) -> Self {
        Self {
            verified: true,
            verification_method: Some(verification_method),
            error: None,
        }
    }

    pub fn failure(error: Error) -> Self {
        Self {
            verified: false,
            verification_method: None,
            error: Some(error),
        }
    }
}

impl From<Result<VerificationMethod, Error>> for VerificationResult {
    fn from(result: Result<VerificationMethod, Error>) -> Self {
        match result {
            Ok(vm) => Self::success(vm),
            Err(e) => Self::failure(e),
        }
    }
}
