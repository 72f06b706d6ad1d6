use serde::{Deserialize, Serialize};

/// A constant as written in a script file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Location { loc: [f64; 3] },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawExpr {
    /// `[1, 2, 3]`. Tried first: struct variants would also accept a sequence.
    Many(Vec<RawValue>),
    /// `{ "var": "name" }`
    Var { var: String },
    /// `{ "list": [ ... ] }`
    List { list: Vec<RawExpr> },
    One(RawValue),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub default: Option<RawExpr>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawReturn {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub multiple: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawFunction {
    pub name: String,
    #[serde(default)]
    pub params: Vec<RawParam>,
    #[serde(default)]
    pub returns: Option<RawReturn>,
    /// Absent for a declaration without a body.
    #[serde(default)]
    pub body: Option<RawExpr>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawCall {
    pub function: String,
    #[serde(default)]
    pub args: Vec<RawExpr>,
    #[serde(default)]
    pub expect: Option<Vec<String>>,
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawTrigger {
    pub on: String,
    #[serde(default)]
    pub calls: Vec<RawCall>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RawScript {
    #[serde(default)]
    pub functions: Vec<RawFunction>,
    #[serde(default)]
    pub triggers: Vec<RawTrigger>,
}
