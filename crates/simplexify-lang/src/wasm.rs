//! WASM bindings for Simplexify
//!
//! The browser form calls [`solve`] with the request object and shows the
//! returned JSON text. [`validate_constraint`] backs per-field feedback.

use wasm_bindgen::prelude::*;

use crate::constraint::Constraint;
use crate::request::SolveRequest;

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

/// Solve `{type, objective, constraints}` and return the result as JSON text
#[wasm_bindgen]
pub fn solve(request: JsValue) -> Result<String, JsValue> {
    let value: serde_json::Value = serde_wasm_bindgen::from_value(request).map_err(js_error)?;
    let request = SolveRequest::try_from(&value)
        .map_err(js_error)?
        .without_blank_constraints();
    crate::solve(&request).map_err(js_error)
}

/// Error message for a single constraint, or `undefined` when it parses
#[wasm_bindgen]
pub fn validate_constraint(text: &str) -> Option<String> {
    Constraint::parse(text).err().map(|e| e.to_string())
}
