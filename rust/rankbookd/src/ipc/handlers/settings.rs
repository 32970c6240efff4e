use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.settings))
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(patch) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing params.patch", None);
    };
    match state.settings.apply_patch(patch) {
        Ok(next) => {
            info!(?next, "session settings updated");
            state.settings = next;
            ok(&req.id, json!(state.settings))
        }
        Err(message) => err(
            &req.id,
            "bad_settings",
            message,
            Some(json!({ "patch": patch })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        _ => None,
    }
}
