use sitewire::{Page, PageConfig};

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
        <button type="submit">Send</button>
      </form>
      <div id="successMessage">Thank you for your feedback!</div>
    </body>
"#;

fn fill_valid(page: &mut Page) -> sitewire::Result<()> {
    page.type_text("#name", "Alice")?;
    page.type_text("#email", "a@b.com")?;
    page.type_text("#subject", "Hi")?;
    page.type_text("#message", "Loved the tour!")?;
    Ok(())
}

#[test]
fn valid_submission_is_stored_and_resets_after_the_delay() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    let entries = page.feedback_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Alice");
    assert_eq!(entries[0].email, "a@b.com");
    assert_eq!(entries[0].subject, "Hi");
    assert_eq!(entries[0].message, "Loved the tour!");
    assert_eq!(entries[0].timestamp, "1970-01-01T00:00:00.000Z");

    page.assert_class("#successMessage", "show", true)?;
    page.assert_value("#name", "Alice")?;

    page.advance_time(2999)?;
    page.assert_value("#name", "Alice")?;
    page.assert_class("#successMessage", "show", true)?;

    page.advance_time_to(3000)?;
    page.assert_value("#name", "")?;
    page.assert_value("#email", "")?;
    page.assert_value("#subject", "")?;
    page.assert_value("#message", "")?;
    page.assert_class("#successMessage", "show", false)?;
    Ok(())
}

#[test]
fn the_stored_timestamp_is_not_earlier_than_the_submission() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.advance_time(5000)?;
    let invoked_at = "1970-01-01T00:00:05.000Z".to_string();

    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    let entries = page.feedback_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].timestamp >= invoked_at);
    Ok(())
}

#[test]
fn an_invalid_email_is_the_only_reported_failure() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.type_text("#name", "Alice")?;
    page.type_text("#email", "not-an-email")?;
    page.type_text("#subject", "Hi")?;
    page.type_text("#message", "Loved the tour!")?;
    page.submit("#feedbackForm")?;

    assert!(page.feedback_entries().is_empty());
    page.assert_class("#email", "error", true)?;
    page.assert_text("#emailError", "Please enter a valid email address")?;
    page.assert_class("#emailError", "show", true)?;

    page.assert_class("#name", "error", false)?;
    page.assert_text("#nameError", "")?;
    page.assert_class("#message", "error", false)?;
    page.assert_text("#messageError", "")?;
    page.assert_class("#successMessage", "show", false)?;
    Ok(())
}

#[test]
fn every_failing_field_is_reported_in_the_same_pass() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.type_text("#email", "broken")?;
    page.type_text("#message", "too short")?;
    page.submit("#feedbackForm")?;

    assert!(page.feedback_entries().is_empty());
    page.assert_text("#nameError", "Please enter your name")?;
    page.assert_text("#emailError", "Please enter a valid email address")?;
    page.assert_text("#messageError", "Please enter a message (at least 10 characters)")?;
    page.assert_class("#name", "error", true)?;
    page.assert_class("#email", "error", true)?;
    page.assert_class("#message", "error", true)?;
    Ok(())
}

#[test]
fn errors_clear_once_the_input_is_corrected() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.dispatch("#feedbackForm", "submit")?;
    page.assert_class("#name", "error", true)?;

    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    page.assert_class("#name", "error", false)?;
    page.assert_text("#nameError", "")?;
    page.assert_class("#nameError", "show", false)?;
    assert_eq!(page.feedback_entries().len(), 1);
    Ok(())
}

#[test]
fn whitespace_only_fields_are_rejected_and_values_stored_trimmed() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.type_text("#name", "   ")?;
    page.type_text("#email", "a@b.com")?;
    page.type_text("#message", "this is long enough")?;
    page.submit("#feedbackForm")?;
    assert!(page.feedback_entries().is_empty());
    page.assert_text("#nameError", "Please enter your name")?;

    page.type_text("#name", "  Alice  ")?;
    page.submit("#feedbackForm")?;
    let entries = page.feedback_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Alice");
    assert_eq!(entries[0].subject, "");
    Ok(())
}

#[test]
fn the_message_length_boundary_sits_at_the_configured_minimum() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.type_text("#name", "Alice")?;
    page.type_text("#email", "a@b.com")?;
    page.type_text("#message", "123456789")?;
    page.submit("#feedbackForm")?;
    assert!(page.feedback_entries().is_empty());

    page.type_text("#message", "1234567890")?;
    page.submit("#feedbackForm")?;
    assert_eq!(page.feedback_entries().len(), 1);
    Ok(())
}

#[test]
fn corrupt_stored_data_is_recovered_as_an_empty_list() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.storage_mut().set_item("feedbackList", "{definitely not json");

    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    let entries = page.feedback_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Alice");

    let key = page.config().storage_key.clone();
    let raw = page.storage().get_item(&key).expect("list stored");
    assert!(raw.starts_with('['));
    Ok(())
}

#[test]
fn submissions_append_in_order() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;
    page.flush()?;

    page.type_text("#name", "Bashir")?;
    page.type_text("#email", "b@c.org")?;
    page.type_text("#message", "Another lovely visit")?;
    page.submit("#feedbackForm")?;

    let names: Vec<String> = page.feedback_entries().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Alice".to_string(), "Bashir".to_string()]);
    Ok(())
}

#[test]
fn a_resubmission_cancels_the_pending_reset() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;
    assert_eq!(page.pending_timers().len(), 1);

    page.advance_time(2000)?;
    page.type_text("#name", "Bashir")?;
    page.type_text("#email", "b@c.org")?;
    page.type_text("#message", "Another lovely visit")?;
    page.submit("#feedbackForm")?;

    // The first timer would have fired at 3000; only the second remains.
    let pending = page.pending_timers();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].due_at, 5000);

    page.advance_time(1500)?;
    page.assert_value("#name", "Bashir")?;

    page.advance_time(1500)?;
    page.assert_value("#name", "")?;
    Ok(())
}

#[test]
fn a_cleared_timer_never_resets_the_form() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    let pending = page.pending_timers();
    assert_eq!(pending.len(), 1);
    assert!(page.clear_timer(pending[0].id));
    assert!(!page.clear_timer(pending[0].id));

    page.advance_time(10_000)?;
    page.assert_value("#name", "Alice")?;
    page.assert_class("#successMessage", "show", true)?;
    Ok(())
}

#[test]
fn flush_runs_the_reset_at_its_deadline() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    assert_eq!(page.flush()?, 1);
    assert_eq!(page.now_ms(), 3000);
    page.assert_value("#name", "")?;
    Ok(())
}

#[test]
fn clicking_the_submit_button_drives_the_same_flow() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    fill_valid(&mut page)?;
    page.click(r#"button[type="submit"]"#)?;

    assert_eq!(page.feedback_entries().len(), 1);
    page.assert_class("#successMessage", "show", true)?;
    Ok(())
}

#[test]
fn the_mailto_handoff_records_an_encoded_navigation() -> sitewire::Result<()> {
    let config = PageConfig {
        mailto: Some("owner@example.test".to_string()),
        ..PageConfig::default()
    };
    let mut page = Page::from_html_with_config(FORM_PAGE, config)?;
    page.type_text("#name", "Alice")?;
    page.type_text("#email", "a@b.com")?;
    page.type_text("#message", "Loved the tour!")?;
    page.submit("#feedbackForm")?;

    let navigations = page.navigations();
    assert_eq!(navigations.len(), 1);
    assert!(navigations[0].starts_with("mailto:owner@example.test?subject=Website%20feedback"));
    assert!(navigations[0].contains("body=Name%3A%20Alice%0AEmail%3A%20a%40b.com"));
    Ok(())
}

#[test]
fn a_successful_save_is_traced() -> sitewire::Result<()> {
    let mut page = Page::from_html(FORM_PAGE)?;
    page.enable_trace(true);
    page.set_trace_stderr(false);

    fill_valid(&mut page)?;
    page.submit("#feedbackForm")?;

    let logs = page.take_trace_logs();
    assert!(
        logs.iter()
            .any(|line| line.starts_with("[storage] feedback saved key=feedbackList entries=1"))
    );
    assert!(logs.iter().any(|line| line.starts_with("[timer] reset scheduled")));
    Ok(())
}
