use proptest::prelude::*;
use sitewire::{FeedbackEntry, LocalStorage, Page};

const FORM_PAGE: &str = r#"
    <body>
      <form id="feedbackForm">
        <input id="name" type="text">
        <span id="nameError" class="error-message"></span>
        <input id="email" type="email">
        <span id="emailError" class="error-message"></span>
        <input id="subject" type="text">
        <textarea id="message"></textarea>
        <span id="messageError" class="error-message"></span>
      </form>
      <div id="successMessage">Thank you!</div>
    </body>
"#;

fn entry_strategy() -> impl Strategy<Value = FeedbackEntry> {
    (
        "[A-Za-z ]{0,12}",
        "[a-z]{1,8}@[a-z]{1,8}\\.[a-z]{2,4}",
        "[A-Za-z0-9 ]{0,16}",
        "[A-Za-z0-9 ,.!?]{0,40}",
        "19[0-9]{2}-01-0[1-9]T0[0-9]:[0-5][0-9]:[0-5][0-9]\\.[0-9]{3}Z",
    )
        .prop_map(|(name, email, subject, message, timestamp)| FeedbackEntry {
            name,
            email,
            subject,
            message,
            timestamp,
        })
}

#[derive(Debug, Clone)]
enum StorageOp {
    Set(String, String),
    Remove(String),
}

fn storage_op_strategy() -> impl Strategy<Value = StorageOp> {
    prop_oneof![
        ("[a-c]", "[a-z0-9]{0,6}").prop_map(|(key, value)| StorageOp::Set(key, value)),
        "[a-c]".prop_map(StorageOp::Remove),
    ]
}

proptest! {
    #[test]
    fn the_feedback_store_roundtrips_through_json(
        entries in proptest::collection::vec(entry_strategy(), 0..8)
    ) {
        let json = serde_json::to_string(&entries).unwrap();
        let back: Vec<FeedbackEntry> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(entries, back);
    }

    // Resubmitting the same input must leave the form byte-for-byte where
    // the first pass left it: errors are cleared and re-derived, never
    // accumulated.
    #[test]
    fn revalidation_is_idempotent(
        name_ok in any::<bool>(),
        email_ok in any::<bool>(),
        message_ok in any::<bool>(),
    ) {
        let mut page = Page::from_html(FORM_PAGE).unwrap();
        if name_ok {
            page.type_text("#name", "Alice").unwrap();
        }
        page.type_text("#email", if email_ok { "a@b.com" } else { "not an email" })
            .unwrap();
        page.type_text("#message", if message_ok { "a perfectly fine message" } else { "nope" })
            .unwrap();

        page.submit("#feedbackForm").unwrap();
        let first_pass = page.dump_dom("#feedbackForm").unwrap();
        let stored_after_first = page.feedback_entries().len();

        page.submit("#feedbackForm").unwrap();
        let second_pass = page.dump_dom("#feedbackForm").unwrap();

        prop_assert_eq!(first_pass, second_pass);

        let all_ok = name_ok && email_ok && message_ok;
        prop_assert_eq!(stored_after_first, if all_ok { 1 } else { 0 });
        prop_assert_eq!(page.feedback_entries().len(), if all_ok { 2 } else { 0 });
    }

    // LocalStorage behaves like a last-write-wins map whose keys keep
    // first-insertion order.
    #[test]
    fn local_storage_matches_a_model_map(
        ops in proptest::collection::vec(storage_op_strategy(), 0..24)
    ) {
        let mut storage = LocalStorage::default();
        let mut model: Vec<(String, String)> = Vec::new();

        for op in ops {
            match op {
                StorageOp::Set(key, value) => {
                    storage.set_item(&key, &value);
                    if let Some(slot) = model.iter_mut().find(|(k, _)| *k == key) {
                        slot.1 = value;
                    } else {
                        model.push((key, value));
                    }
                }
                StorageOp::Remove(key) => {
                    storage.remove_item(&key);
                    model.retain(|(k, _)| *k != key);
                }
            }
        }

        prop_assert_eq!(storage.len(), model.len());
        prop_assert_eq!(storage.is_empty(), model.is_empty());
        let keys: Vec<&str> = storage.keys().collect();
        let model_keys: Vec<&str> = model.iter().map(|(k, _)| k.as_str()).collect();
        prop_assert_eq!(keys, model_keys);
        for (key, value) in &model {
            prop_assert_eq!(storage.get_item(key), Some(value.as_str()));
        }
    }
}
