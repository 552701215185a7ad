//! models/params_model.rs
//! Esquemas de parámetros por operación. Cada struct define los campos,
//! sus valores por defecto y las reglas extra (emails, listas no vacías...).
//! Lo validado se re-serializa a JSON: ese JSON es lo que se audita y lo que
//! se manda al proveedor.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("regex de email inválida"));

const NON_FIELD: &str = "non_field_errors";

/// Entrada rechazada antes de llegar al pipeline. Mapa campo -> mensaje.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid parameters: {errors:?}")]
pub struct ValidationError {
    pub errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.into());
        Self { errors }
    }

    /// serde no expone el campo de forma estructurada; lo sacamos del
    /// mensaje cuando viene como "missing field `x`".
    fn from_serde(err: serde_json::Error) -> Self {
        let msg = err.to_string();
        let field = missing_field(&msg).unwrap_or(NON_FIELD).to_string();
        Self::single(&field, msg)
    }

    /// Igual que `from_serde`, pero para errores de tipo (`id_task: "abc"`,
    /// fecha mal formada) busca el campo culpable: se quita cada clave de
    /// `raw` y se reintenta. La clave cuya ausencia elimina el error (o lo
    /// convierte en "missing field" de sí misma) es la que falla.
    fn locate<P: DeserializeOwned>(raw: &Map<String, Value>, err: serde_json::Error) -> Self {
        let msg = err.to_string();
        if missing_field(&msg).is_some() {
            return Self::from_serde(err);
        }

        for key in raw.keys() {
            let mut without = raw.clone();
            without.remove(key);
            match serde_json::from_value::<P>(Value::Object(without)) {
                Ok(_) => return Self::single(key, msg),
                Err(e) if missing_field(&e.to_string()) == Some(key.as_str()) => {
                    return Self::single(key, msg)
                }
                Err(_) => {}
            }
        }

        Self::single(NON_FIELD, msg)
    }
}

fn missing_field(msg: &str) -> Option<&str> {
    msg.strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

/// Reglas que serde no puede expresar. Devuelve (campo, mensaje).
pub trait Validate {
    fn problems(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Valida `raw` contra el esquema `P` y devuelve el JSON canónico.
pub fn validate_params<P>(raw: Value) -> Result<Value, ValidationError>
where
    P: DeserializeOwned + Serialize + Validate,
{
    let Value::Object(fields) = raw else {
        return Err(ValidationError::single(NON_FIELD, "expected a JSON object"));
    };

    let params: P = serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| ValidationError::locate::<P>(&fields, e))?;

    let problems = params.problems();
    if !problems.is_empty() {
        return Err(ValidationError {
            errors: problems
                .into_iter()
                .map(|(field, msg)| (field.to_string(), msg))
                .collect(),
        });
    }

    serde_json::to_value(&params)
        .map(|value| canonicalize(&value))
        .map_err(ValidationError::from_serde)
}

/// Copia de `value` con las claves de cada objeto en orden lexicográfico,
/// independiente de cómo esté configurado `serde_json::Map`.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Convierte pares de query string en un objeto JSON.
/// Claves repetidas (`?id=a&id=b`) se convierten en lista.
pub fn query_to_value(pairs: Vec<(String, String)>) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        match map.remove(&key) {
            None => {
                map.insert(key, Value::String(value));
            }
            Some(Value::Array(mut items)) => {
                items.push(Value::String(value));
                map.insert(key, Value::Array(items));
            }
            Some(previous) => {
                map.insert(key, Value::Array(vec![previous, Value::String(value)]));
            }
        }
    }
    Value::Object(map)
}

/// Serializa el payload de auditoría. `None` => sin payload (NULL), nunca "{}".
pub fn audit_payload(params: Option<&Value>) -> Result<Option<String>, serde_json::Error> {
    params
        .map(|value| serde_json::to_string(&canonicalize(value)))
        .transpose()
}

fn check_email(field: &'static str, value: &str, out: &mut Vec<(&'static str, String)>) {
    if !EMAIL_RE.is_match(value) {
        out.push((field, "Enter a valid email address.".to_string()));
    }
}

fn check_opt_email(field: &'static str, value: &Option<String>, out: &mut Vec<(&'static str, String)>) {
    if let Some(v) = value {
        check_email(field, v, out);
    }
}

fn check_not_blank(field: &'static str, value: &str, out: &mut Vec<(&'static str, String)>) {
    if value.trim().is_empty() {
        out.push((field, "This field may not be blank.".to_string()));
    }
}

fn default_one() -> i64 {
    1
}

fn default_hundred() -> i64 {
    100
}

// ---------------------------------------------------------------------------
// Direcciones de remitente
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderAddress {
    pub address: String,
}

impl Validate for SenderAddress {
    fn problems(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        check_email("address", &self.address, &mut out);
        out
    }
}

// ---------------------------------------------------------------------------
// Tareas (campañas)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTasks {
    #[serde(default = "default_one", deserialize_with = "lenient::int")]
    pub range_start: i64,
    #[serde(default = "default_hundred", deserialize_with = "lenient::int")]
    pub range_end: i64,
}

impl Validate for GetTasks {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTask {
    #[serde(deserialize_with = "lenient::int")]
    pub id_task: i64,
}

impl Validate for GetTask {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTask {
    pub name: String,
    pub sender_email: String,
    pub sender_name: String,
    pub subject: String,
    pub text: String,
    #[serde(default = "default_one", deserialize_with = "lenient::int")]
    pub type_task: i64,
    #[serde(default, with = "iso_datetime")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, with = "iso_datetime")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: String,
    /// Pares `[id, incluido]`
    #[serde(default)]
    pub contact_list: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub duplicates: Option<bool>,
}

impl Validate for AddTask {
    fn problems(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        check_not_blank("name", &self.name, &mut out);
        check_email("sender_email", &self.sender_email, &mut out);
        check_not_blank("sender_name", &self.sender_name, &mut out);
        check_not_blank("subject", &self.subject, &mut out);
        check_not_blank("text", &self.text, &mut out);
        if let Some(contacts) = &self.contact_list {
            if contacts.iter().any(|pair| pair.len() != 2) {
                out.push((
                    "contact_list",
                    "Each contact must be a pair of exactly 2 items.".to_string(),
                ));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTask {
    #[serde(deserialize_with = "lenient::int")]
    pub id_task: i64,
    #[serde(flatten)]
    pub task: AddTask,
}

impl Validate for EditTask {
    fn problems(&self) -> Vec<(&'static str, String)> {
        self.task.problems()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTaskStatus {
    #[serde(deserialize_with = "lenient::int")]
    pub id_task: i64,
    pub task_state: String,
}

impl Validate for EditTaskStatus {
    fn problems(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        check_not_blank("task_state", &self.task_state, &mut out);
        out
    }
}

// ---------------------------------------------------------------------------
// Plantillas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTemplate {
    #[serde(deserialize_with = "lenient::int")]
    pub id_template: i64,
}

impl Validate for GetTemplate {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTemplate {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub user_template_id: Option<String>,
}

impl Validate for AddTemplate {
    fn problems(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        check_not_blank("name", &self.name, &mut out);
        check_not_blank("text", &self.text, &mut out);
        check_opt_email("sender_email", &self.sender_email, &mut out);
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditTemplate {
    #[serde(deserialize_with = "lenient::int")]
    pub id_template: i64,
    #[serde(flatten)]
    pub template: AddTemplate,
}

impl Validate for EditTemplate {
    fn problems(&self) -> Vec<(&'static str, String)> {
        self.template.problems()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelTemplate {
    #[serde(deserialize_with = "lenient::int")]
    pub id_template: i64,
}

impl Validate for DelTemplate {}

// ---------------------------------------------------------------------------
// Estado de entregas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetState {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub id_task: Option<i64>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl Validate for GetState {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStateDetailing {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub id_task: Option<i64>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default = "default_one", deserialize_with = "lenient::int")]
    pub range_start: i64,
    #[serde(default = "default_hundred", deserialize_with = "lenient::int")]
    pub range_end: i64,
}

impl Validate for GetStateDetailing {}

// ---------------------------------------------------------------------------
// Mensajes transaccionales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessage {
    pub sender_email: String,
    pub sender_name: String,
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub text: String,
    #[serde(default)]
    pub user_message_id: Option<String>,
    #[serde(default)]
    pub user_campaign_id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl Validate for SendMessage {
    fn problems(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        check_email("sender_email", &self.sender_email, &mut out);
        check_not_blank("sender_name", &self.sender_name, &mut out);
        check_email("recipient_email", &self.recipient_email, &mut out);
        check_not_blank("recipient_name", &self.recipient_name, &mut out);
        check_not_blank("subject", &self.subject, &mut out);
        check_not_blank("text", &self.text, &mut out);
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStatusMessages {
    #[serde(deserialize_with = "lenient::string_list")]
    pub id_messages: Vec<String>,
}

impl Validate for GetStatusMessages {
    fn problems(&self) -> Vec<(&'static str, String)> {
        if self.id_messages.is_empty() {
            vec![("id_messages", "This list may not be empty.".to_string())]
        } else {
            Vec::new()
        }
    }
}

/// Formato único de fecha-hora para auditoría y para el proveedor:
/// RFC 3339 en UTC con offset explícito (`2017-08-01T00:00:00+00:00`).
pub mod iso_datetime {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(s) = raw else {
            return Ok(None);
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        // sin offset se asume UTC
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

/// Deserializadores tolerantes: el query string sólo trae texto.
mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<String>),
        One(String),
    }

    pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match IntOrString::deserialize(deserializer)? {
            IntOrString::Int(n) => Ok(n),
            IntOrString::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("A valid integer is required, got {s:?}"))),
        }
    }

    pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<IntOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(IntOrString::Int(n)) => Ok(Some(n)),
            Some(IntOrString::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(IntOrString::Str(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("A valid integer is required, got {s:?}"))),
        }
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        })
    }
}
