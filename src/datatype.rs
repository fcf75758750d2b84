// used to keep bags ordered, which gives stable printouts
use std::collections::BTreeMap;
// used to print out readable forms of a value
use std::fmt;
// used to expose the compiled expression behind a pattern
use std::ops;
// used when parsing a kind name to a Kind
use std::str::FromStr;
use std::sync::Arc;
// callable identities are handed out process-wide
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;

use crate::error::{NamedCallError, Result};

/// Name to value mapping used for named argument bags, defaults and object values.
pub type Bag = BTreeMap<String, Value>;

// ------------- Kind -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Boolean,
    Number,
    String,
    Object,
    Function,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Object => "object",
            Kind::Function => "function",
        }
    }
}
impl FromStr for Kind {
    type Err = NamedCallError;
    fn from_str(s: &str) -> Result<Kind> {
        match s {
            "null" => Ok(Kind::Null),
            "boolean" => Ok(Kind::Boolean),
            "number" => Ok(Kind::Number),
            "string" => Ok(Kind::String),
            "object" => Ok(Kind::Object),
            "function" => Ok(Kind::Function),
            _ => Err(NamedCallError::InvalidSpecification(format!(
                "unknown kind '{}'",
                s
            ))),
        }
    }
}
impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- Class -------------
/// A constructor reference. Identity is the allocation, never the name, so two
/// classes that happen to share a name are unrelated.
#[derive(Debug)]
pub struct Class {
    name: String,
    parent: Option<Arc<Class>>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }
    pub fn extends(name: impl Into<String>, parent: &Arc<Class>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }
}

fn descends(class: &Arc<Class>, ancestor: &Arc<Class>) -> bool {
    let mut current = Some(class);
    while let Some(c) = current {
        if Arc::ptr_eq(c, ancestor) {
            return true;
        }
        current = c.parent.as_ref();
    }
    false
}

#[derive(Debug, Clone)]
pub struct Instance {
    class: Arc<Class>,
    fields: Bag,
}

impl Instance {
    pub fn new(class: &Arc<Class>, fields: Bag) -> Self {
        Self {
            class: Arc::clone(class),
            fields,
        }
    }
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }
    pub fn fields(&self) -> &Bag {
        &self.fields
    }
    pub fn is_instance_of(&self, class: &Arc<Class>) -> bool {
        descends(&self.class, class)
    }
}

// ------------- Pattern -------------
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Pattern> {
        Ok(Pattern(Regex::new(source)?))
    }
}
impl ops::Deref for Pattern {
    type Target = Regex;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/", self.0.as_str())
    }
}

// ------------- Callable -------------
pub type CallableId = u64;

// ids start at 1
static NEXT_CALLABLE: AtomicU64 = AtomicU64::new(1);

type Body = dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync;

/// An invocable unit. The body receives the scope (receiver) and the positional
/// arguments; whatever it returns, error included, reaches the caller untouched.
pub struct Callable {
    id: CallableId,
    name: String,
    source: Option<String>,
    body: Box<Body>,
}

impl Callable {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            id: NEXT_CALLABLE.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            source: None,
            body: Box::new(body),
        }
    }
    /// Keeps the textual definition around so the parameter order can be inferred
    /// from it when nothing has been declared.
    pub fn with_source<F>(source: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let source = source.into();
        let name = source
            .split('(')
            .next()
            .and_then(|head| head.split_whitespace().last())
            .filter(|token| !matches!(*token, "fn" | "function"))
            .unwrap_or("anonymous")
            .to_string();
        let mut callable = Self::new(name, body);
        callable.source = Some(source);
        callable
    }
    /// Wraps a plain test into a one-argument callable returning a boolean.
    pub fn predicate<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |_, args| {
            Ok(Value::Boolean(test(args.first().unwrap_or(&Value::Null))))
        })
    }
    pub fn id(&self) -> CallableId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
    pub fn call(&self, scope: &Value, args: &[Value]) -> Result<Value> {
        (self.body)(scope, args)
    }
}
impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Callable")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

// ------------- Value -------------
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Bag),
    Instance(Instance),
    Function(Arc<Callable>),
    Class(Arc<Class>),
    Pattern(Pattern),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Boolean(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) | Value::Object(_) | Value::Instance(_) | Value::Pattern(_) => {
                Kind::Object
            }
            Value::Function(_) | Value::Class(_) => Kind::Function,
        }
    }
    pub fn data_type(&self) -> &'static str {
        self.kind().name()
    }
    /// Kind name, or the class name for instances. Used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Instance(instance) => instance.class().name().to_string(),
            other => other.data_type().to_string(),
        }
    }
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn is_instance_of(&self, class: &Arc<Class>) -> bool {
        match self {
            Value::Instance(instance) => instance.is_instance_of(class),
            _ => false,
        }
    }
    pub fn as_callable(&self) -> Option<&Arc<Callable>> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_bag(&self) -> Option<&Bag> {
        match self {
            Value::Object(bag) => Some(bag),
            _ => None,
        }
    }
    pub fn instance(class: &Arc<Class>, fields: Bag) -> Value {
        Value::Instance(Instance::new(class, fields))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => {
                Arc::ptr_eq(a.class(), b.class()) && a.fields() == b.fields()
            }
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Pattern(a), Value::Pattern(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(bag) => {
                write!(f, "{{")?;
                for (i, (name, value)) in bag.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Instance(instance) => write!(f, "[object {}]", instance.class().name()),
            Value::Function(callable) => write!(f, "function {}", callable.name()),
            Value::Class(class) => write!(f, "class {}", class.name()),
            Value::Pattern(pattern) => write!(f, "{}", pattern),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}
impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}
impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<Kind> for Value {
    fn from(kind: Kind) -> Self {
        Value::String(kind.name().to_string())
    }
}
impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
impl From<Bag> for Value {
    fn from(bag: Bag) -> Self {
        Value::Object(bag)
    }
}
impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}
impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Function(Arc::new(callable))
    }
}
impl From<Arc<Callable>> for Value {
    fn from(callable: Arc<Callable>) -> Self {
        Value::Function(callable)
    }
}
impl From<Arc<Class>> for Value {
    fn from(class: Arc<Class>) -> Self {
        Value::Class(class)
    }
}
impl From<&Arc<Class>> for Value {
    fn from(class: &Arc<Class>) -> Self {
        Value::Class(Arc::clone(class))
    }
}
impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        Value::Pattern(pattern)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Reads a named argument bag from a JSON object.
pub fn bag_from_json(json: serde_json::Value) -> Result<Bag> {
    match Value::from(json) {
        Value::Object(bag) => Ok(bag),
        other => Err(NamedCallError::InvalidSpecification(format!(
            "named arguments must be an object, found {}",
            other.data_type()
        ))),
    }
}

/// Builds a [`Bag`] from `name => value` pairs.
#[macro_export]
macro_rules! named {
    () => { $crate::datatype::Bag::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut bag = $crate::datatype::Bag::new();
        $( bag.insert(::std::string::String::from($name), $crate::datatype::Value::from($value)); )+
        bag
    }};
}

// ------------- Type specification -------------
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Kind(Kind),
    Instance(Arc<Class>),
}

impl TypeSpec {
    pub fn check(&self, value: &Value) -> bool {
        match self {
            TypeSpec::Kind(kind) => value.kind() == *kind,
            TypeSpec::Instance(class) => value.is_instance_of(class),
        }
    }
    /// Accepts a kind name or a constructor reference.
    pub fn from_value(declared: &Value) -> Result<TypeSpec> {
        match declared {
            Value::String(name) => match Kind::from_str(name)? {
                Kind::Null => Err(NamedCallError::InvalidSpecification(
                    "null is not a usable type, a typed parameter is required".to_string(),
                )),
                kind => Ok(TypeSpec::Kind(kind)),
            },
            Value::Class(class) => Ok(TypeSpec::Instance(Arc::clone(class))),
            other => Err(NamedCallError::InvalidSpecification(format!(
                "type must be a kind name or a class, found {}",
                other
            ))),
        }
    }
}
impl From<Kind> for TypeSpec {
    fn from(kind: Kind) -> Self {
        TypeSpec::Kind(kind)
    }
}
impl From<Arc<Class>> for TypeSpec {
    fn from(class: Arc<Class>) -> Self {
        TypeSpec::Instance(class)
    }
}
impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeSpec::Kind(kind) => write!(f, "{}", kind),
            TypeSpec::Instance(class) => write!(f, "{}", class.name()),
        }
    }
}
