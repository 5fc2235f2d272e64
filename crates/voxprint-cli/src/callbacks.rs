//! Console host: every side effect the engine requests is printed.

use std::sync::Arc;

use voxprint_intent::{HostCallbacks, ModalRequest, Navigation};

/// Spoken name of a document, falling back to its 1-based number.
fn name_of(documents: &[String], index: usize) -> String {
    documents
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("document {}", index + 1))
}

fn names_of(documents: &[String], indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| name_of(documents, *i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Callbacks that narrate side effects to stdout.
pub fn console_callbacks(documents: Arc<Vec<String>>) -> HostCallbacks {
    let select_one = Arc::clone(&documents);
    let select_many = Arc::clone(&documents);
    let deselect = Arc::clone(&documents);

    HostCallbacks::new()
        .with_select_document(move |i| println!("  -> select {}", name_of(&select_one, i)))
        .with_select_multiple_documents(move |ix| {
            println!("  -> select {}", names_of(&select_many, ix));
        })
        .with_deselect_documents(move |ix| {
            if ix.is_empty() {
                println!("  -> deselect focused document");
            } else {
                println!("  -> deselect {}", names_of(&deselect, ix));
            }
        })
        .with_clear_selection(|| println!("  -> clear selection"))
        .with_toggle_focused_document(|| println!("  -> toggle focused document"))
        .with_switch_section(|section| println!("  -> show section {section}"))
        .with_update_settings(|patch| match serde_json::to_string(patch) {
            Ok(json) => println!("  -> settings {json}"),
            Err(_) => println!("  -> settings {}", patch.summary()),
        })
        .with_navigate(|nav| {
            let what = match nav {
                Navigation::NextDocument => "next document",
                Navigation::PreviousDocument => "previous document",
                Navigation::ScrollUp => "scroll up",
                Navigation::ScrollDown => "scroll down",
                Navigation::NextStep => "next step",
                Navigation::PreviousStep => "previous step",
            };
            println!("  -> {what}");
        })
        .with_execute(|request| println!("  -> execute {request:?}"))
        .with_feed_documents(|| println!("  -> feed documents"))
        .with_modal(|modal| match modal {
            ModalRequest::Open(kind) => println!("  -> open {kind:?} dialog"),
            ModalRequest::Close => println!("  -> close dialog"),
        })
        .with_show_toast(|text, feedback| println!("  -> toast ({feedback:?}) {text}"))
        .with_mode_switch(|mode, polite| {
            println!("  -> switch to {} mode (polite: {polite})", mode.label());
        })
        .with_set_scan_source(|source| println!("  -> scan source {}", source.label()))
        .with_state_change(|update| {
            println!(
                "  -> state {:?} / {:?}",
                update.new_state, update.new_step
            );
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_fall_back_to_numbers() {
        let docs = vec!["report.pdf".to_string()];
        assert_eq!(name_of(&docs, 0), "report.pdf");
        assert_eq!(name_of(&docs, 4), "document 5");
        assert_eq!(names_of(&docs, &[0, 1]), "report.pdf, document 2");
    }

    #[test]
    fn every_callback_is_wired() {
        let callbacks = console_callbacks(Arc::new(Vec::new()));
        let debug = format!("{callbacks:?}");
        for name in ["select_document", "execute", "state_change", "toggle_focused_document"] {
            assert!(debug.contains(name), "{name} missing from {debug}");
        }
    }
}
