//! Response envelopes shared by all handlers.

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct One {
    pub data: Value,
}

#[derive(Serialize)]
pub struct Many {
    pub data: Vec<Value>,
    pub meta: Meta,
}

#[derive(Serialize)]
pub struct Meta {
    pub count: u64,
}

pub fn one(data: Value) -> One {
    One { data }
}

pub fn many(data: Vec<Value>) -> Many {
    let count = data.len() as u64;
    Many {
        data,
        meta: Meta { count },
    }
}
