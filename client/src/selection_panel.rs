use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use isomap_shared::selection::{self, PROMPT_TEXT};
use isomap_shared::{SelectionFlow, TileCoord};

use crate::app::LedgerHandle;
use crate::ledger::JsonRpcLedger;

/// Start a pick and resolve its occupancy in the background.
pub(crate) fn pick_tile(flow: RwSignal<SelectionFlow>, ledger: JsonRpcLedger, tile: TileCoord) {
    let Some(ticket) = flow.try_update(|f| f.begin_pick(tile)) else {
        return;
    };
    spawn_local(async move {
        let result = selection::query(&ledger, ticket).await;
        flow.update(|f| {
            f.resolve_query(ticket, result);
        });
    });
}

fn confirm(flow: RwSignal<SelectionFlow>, ledger: JsonRpcLedger) {
    let ticket = match flow.try_update(|f| f.begin_confirm()) {
        Some(Ok(ticket)) => ticket,
        Some(Err(err)) => {
            tracing::debug!(error = %err, "occupy ignored");
            return;
        }
        None => return,
    };
    spawn_local(async move {
        let result = selection::occupy(&ledger, ticket.tile).await;
        flow.update(|f| {
            f.complete_occupy(ticket, result);
        });
    });
}

/// Status overlay for the picked tile plus the occupy prompt.
#[component]
pub fn SelectionPanel() -> impl IntoView {
    let flow: RwSignal<SelectionFlow> = expect_context();
    let LedgerHandle(ledger) = expect_context();

    let on_occupy = move |_| confirm(flow, ledger.get_value());
    let on_cancel = move |_| flow.update(|f| f.cancel());

    view! {
        <div style="position: absolute; top: 16px; left: 16px; z-index: 6; font-family: system-ui, sans-serif; font-size: 0.85rem; color: #111;">
            {move || {
                let Some(sel) = flow.with(|f| f.selection().copied()) else {
                    return ().into_any();
                };
                let querying = flow.with(|f| f.is_querying());
                view! {
                    <div style="background: rgba(255,255,255,0.92); border: 1px solid #444; border-radius: 4px; padding: 8px 10px; min-width: 220px;">
                        <div>{sel.coordinates_text()}</div>
                        <div>{if querying { "Tile Status: ...".to_string() } else { sel.status_text() }}</div>
                    </div>
                }
                .into_any()
            }}
            <div
                style="background: rgba(255,255,255,0.96); border: 1px solid #444; border-radius: 4px; padding: 8px 10px; margin-top: 6px;"
                style:display=move || if flow.with(|f| f.prompt_open()) { "block" } else { "none" }
            >
                <div style="margin-bottom: 6px;">{PROMPT_TEXT}</div>
                <button
                    on:click=on_occupy
                    disabled=move || flow.with(|f| f.is_confirming())
                >
                    "Occupy"
                </button>
                <button on:click=on_cancel style="margin-left: 6px;">"Cancel"</button>
            </div>
            {move || {
                flow.with(|f| f.notice().map(|n| (n.text(), n.is_error())))
                    .map(|(text, is_error)| {
                        let color = if is_error { "#b00020" } else { "#1b5e20" };
                        view! {
                            <div style={format!("margin-top: 6px; padding: 4px 8px; background: rgba(255,255,255,0.92); color: {color};")}>
                                {text}
                            </div>
                        }
                    })
            }}
        </div>
    }
}
