use std::collections::HashMap;

use crate::behaviors::back_to_top::BackToTopState;
use crate::behaviors::feedback_form::FeedbackState;
use crate::behaviors::lightbox::LightboxState;
use crate::behaviors::{self, Handler};
use crate::config::PageConfig;
use crate::dom::{Dom, NodeId};
use crate::events::{EventState, ListenerStore};
use crate::html::parse_html;
use crate::location::DocumentUrl;
use crate::scheduler::{PendingTimer, ScheduledTask, SchedulerState, TimerCallback};
use crate::storage::{self, FeedbackEntry, LocalStorage};
use crate::trace::TraceState;
use crate::{Error, Result};

const DISPATCH_STACK_BYTES: usize = 32 * 1024 * 1024;

/// A smooth-scroll animation the page asked the viewport to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub top: i64,
}

/// A loaded document with its behaviors wired, a virtual clock and
/// origin-local storage. All interaction and inspection goes through here.
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) scheduler: SchedulerState,
    pub(crate) storage: LocalStorage,
    pub(crate) trace: TraceState,
    pub(crate) config: PageConfig,
    pub(crate) url: DocumentUrl,
    scroll_y: i64,
    element_tops: HashMap<NodeId, i64>,
    scroll_requests: Vec<ScrollRequest>,
    navigations: Vec<String>,
    pub(crate) feedback: FeedbackState,
    pub(crate) lightbox: LightboxState,
    pub(crate) back_to_top: BackToTopState,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, PageConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: PageConfig) -> Result<Self> {
        let dom = parse_html(html)?;
        let url = DocumentUrl::parse(&config.url);
        let mut page = Self {
            dom,
            listeners: ListenerStore::default(),
            scheduler: SchedulerState::default(),
            storage: LocalStorage::default(),
            trace: TraceState::default(),
            config,
            url,
            scroll_y: 0,
            element_tops: HashMap::new(),
            scroll_requests: Vec::new(),
            navigations: Vec::new(),
            feedback: FeedbackState::default(),
            lightbox: LightboxState::default(),
            back_to_top: BackToTopState::default(),
        };
        behaviors::install_all(&mut page)?;
        Ok(page)
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut LocalStorage {
        &mut self.storage
    }

    pub fn feedback_entries(&self) -> Vec<FeedbackEntry> {
        storage::read_entries(&self.storage, &self.config.storage_key)
    }

    pub fn scroll_top(&self) -> i64 {
        self.scroll_y
    }

    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.scroll_requests
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    // User interactions --------------------------------------------------

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let click_outcome = self.dispatch_event(target, "click")?;
        if click_outcome.default_prevented {
            return Ok(());
        }

        if let Some(anchor) = self.containing_anchor(target) {
            if let Some(href) = self.dom.attr(anchor, "href") {
                return self.follow_link(&href);
            }
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = self.dom.find_ancestor_by_tag(target, "form") {
                self.dispatch_event(form, "submit")?;
            }
        }

        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;

        let form = if self
            .dom
            .tag_name(target)
            .map(|t| t.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            Some(target)
        } else {
            self.dom.find_ancestor_by_tag(target, "form")
        };

        if let Some(form_id) = form {
            self.dispatch_event(form_id, "submit")?;
        }
        Ok(())
    }

    pub fn press_key(&mut self, key: &str) -> Result<()> {
        let root = self.dom.root;
        self.dispatch_event_state(EventState::with_key("keydown", root, key))?;
        Ok(())
    }

    /// Moves the viewport the way a user gesture would: instantly, firing
    /// a scroll event when the offset actually changes.
    pub fn scroll_to(&mut self, top: i64) -> Result<()> {
        self.jump_to(top)
    }

    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event_type)?;
        Ok(())
    }

    // Virtual clock ------------------------------------------------------

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending()
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.cancel(timer_id);
        if existed {
            self.trace_timer_line(format!("[timer] cleared id={timer_id}"));
        }
        existed
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::PageRuntime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.scheduler.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        let from = self.scheduler.now_ms;
        self.scheduler.now_ms = from.saturating_add(delta_ms.max(0));
        let ran = self.run_due_timers_internal()?;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={} from={} to={} ran_due={}",
            delta_ms, from, self.scheduler.now_ms, ran
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let from = self.scheduler.now_ms;
        if target_ms > from {
            self.scheduler.now_ms = target_ms;
        }
        let ran = self.run_due_timers_internal()?;
        self.trace_timer_line(format!(
            "[timer] advance_to from={} to={} ran_due={}",
            from, self.scheduler.now_ms, ran
        ));
        Ok(())
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        self.run_due_timers_internal()
    }

    /// Runs every queued task, advancing the clock to each deadline.
    pub fn flush(&mut self) -> Result<usize> {
        let from = self.scheduler.now_ms;
        let mut ran = 0usize;
        while let Some(task) = self.scheduler.take_next() {
            if task.due_at > self.scheduler.now_ms {
                self.scheduler.now_ms = task.due_at;
            }
            self.run_timer_callback(task)?;
            ran += 1;
            if ran > self.scheduler.timer_step_limit {
                return Err(Error::PageRuntime("timer step limit exceeded".into()));
            }
        }
        self.trace_timer_line(format!(
            "[timer] flush from={} to={} ran={}",
            from, self.scheduler.now_ms, ran
        ));
        Ok(ran)
    }

    fn run_due_timers_internal(&mut self) -> Result<usize> {
        let mut ran = 0usize;
        while let Some(task) = self.scheduler.take_next_due() {
            self.run_timer_callback(task)?;
            ran += 1;
            if ran > self.scheduler.timer_step_limit {
                return Err(Error::PageRuntime("timer step limit exceeded".into()));
            }
        }
        Ok(ran)
    }

    fn run_timer_callback(&mut self, task: ScheduledTask) -> Result<()> {
        self.trace_timer_line(format!("[timer] run id={} due_at={}", task.id, task.due_at));
        match task.callback {
            TimerCallback::ResetFeedbackForm => behaviors::feedback_form::reset_form(self),
        }
    }

    // Layout ledger ------------------------------------------------------

    /// Records where an element's top sits in the document, since no real
    /// layout exists. Unset elements sit at offset 0.
    pub fn set_element_top(&mut self, selector: &str, top: i64) -> Result<()> {
        let target = self.select_one(selector)?;
        self.element_tops.insert(target, top);
        Ok(())
    }

    pub(crate) fn element_top(&self, node: NodeId) -> i64 {
        self.element_tops.get(&node).copied().unwrap_or(0)
    }

    // Tracing ------------------------------------------------------------

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.logs.drain(..).collect()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace.timers = enabled;
    }

    pub fn set_trace_storage(&mut self, enabled: bool) {
        self.trace.storage = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::PageRuntime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.log_limit = max_entries;
        while self.trace.logs.len() > self.trace.log_limit {
            self.trace.logs.pop_front();
        }
        Ok(())
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace.enabled && self.trace.events {
            self.trace.push(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace.enabled && self.trace.timers {
            self.trace.push(line);
        }
    }

    pub(crate) fn trace_storage_line(&mut self, line: String) {
        if self.trace.enabled && self.trace.storage {
            self.trace.push(line);
        }
    }

    // Assertions ---------------------------------------------------------

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual == expected {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: self.node_snippet(target),
        })
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual == expected {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: self.node_snippet(target),
        })
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(self.dom.has_class(target, class_name))
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.has_class(target, class_name);
        if actual == expected {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            expected: format!("class \"{class_name}\" present={expected}"),
            actual: format!("present={actual}"),
            dom_snippet: self.node_snippet(target),
        })
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    // Internals ----------------------------------------------------------

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventState> {
        self.dispatch_event_state(EventState::new(event_type, target))
    }

    fn dispatch_event_state(&mut self, event: EventState) -> Result<EventState> {
        stacker::grow(DISPATCH_STACK_BYTES, || {
            self.dispatch_event_state_inner(event)
        })
    }

    fn dispatch_event_state_inner(&mut self, mut event: EventState) -> Result<EventState> {
        let mut path = Vec::new();
        let mut cursor = Some(event.target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        if path.is_empty() {
            return Ok(event);
        }

        // Capture phase.
        if path.len() >= 2 {
            for node in &path[..path.len() - 1] {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, true)?;
            }
        }

        // Target phase: capture listeners first, then bubble listeners.
        let target = event.target;
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        self.invoke_listeners(target, &mut event, false)?;

        // Bubble phase.
        if path.len() >= 2 {
            for node in path[..path.len() - 1].iter().rev() {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
            }
        }

        self.trace_event_line(format!(
            "[event] done {} default_prevented={}",
            event.event_type, event.default_prevented
        ));
        Ok(event)
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut EventState,
        capture: bool,
    ) -> Result<()> {
        for listener in self.listeners.get(node_id, &event.event_type, capture) {
            if self.trace.enabled && self.trace.events {
                let phase = if capture { "capture" } else { "bubble" };
                let line = format!(
                    "[event] {} handler={:?} phase={} default_prevented={}",
                    event.event_type, listener.handler, phase, event.default_prevented
                );
                self.trace.push(line);
            }
            self.run_handler(listener.handler, event)?;
        }
        Ok(())
    }

    fn run_handler(&mut self, handler: Handler, event: &mut EventState) -> Result<()> {
        match handler {
            Handler::FeedbackSubmit => behaviors::feedback_form::on_submit(self, event),
            Handler::LightboxThumbnail => behaviors::lightbox::on_thumbnail_click(self, event),
            Handler::LightboxClose => behaviors::lightbox::on_close_click(self, event),
            Handler::LightboxBackdrop => behaviors::lightbox::on_backdrop_click(self, event),
            Handler::LightboxKeydown => behaviors::lightbox::on_keydown(self, event),
            Handler::SmoothScrollAnchor => behaviors::smooth_scroll::on_anchor_click(self, event),
            Handler::BackToTopScroll => behaviors::back_to_top::on_scroll(self, event),
            Handler::BackToTopClick => behaviors::back_to_top::on_click(self, event),
            Handler::MenuToggle => behaviors::mobile_menu::on_toggle_click(self, event),
        }
    }

    fn containing_anchor(&self, node: NodeId) -> Option<NodeId> {
        if self
            .dom
            .tag_name(node)
            .map(|t| t.eq_ignore_ascii_case("a"))
            .unwrap_or(false)
        {
            return Some(node);
        }
        self.dom.find_ancestor_by_tag(node, "a")
    }

    // The default action of an unhandled link click: fragment links jump
    // in place, everything else leaves the page.
    fn follow_link(&mut self, href: &str) -> Result<()> {
        if let Some(fragment) = href.strip_prefix('#') {
            if fragment.is_empty() {
                return self.jump_to(0);
            }
            if let Some(target) = self.dom.by_id(fragment) {
                let top = self.element_top(target);
                return self.jump_to(top);
            }
            return Ok(());
        }
        self.record_navigation(href);
        Ok(())
    }

    fn jump_to(&mut self, top: i64) -> Result<()> {
        if self.scroll_y != top {
            self.scroll_y = top;
            let root = self.dom.root;
            self.dispatch_event(root, "scroll")?;
        }
        Ok(())
    }

    pub(crate) fn smooth_scroll_to(&mut self, top: i64) -> Result<()> {
        self.scroll_requests.push(ScrollRequest { top });
        self.jump_to(top)
    }

    pub(crate) fn record_navigation(&mut self, href: &str) {
        self.trace_event_line(format!("[nav] {href}"));
        self.navigations.push(href.to_string());
    }

    pub(crate) fn iso_timestamp(&self) -> Result<String> {
        let unix_ms = self.config.time_origin_ms.saturating_add(self.scheduler.now_ms);
        let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(unix_ms)
            .ok_or_else(|| Error::PageRuntime(format!("timestamp out of range: {unix_ms}")))?;
        Ok(when.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}

fn is_submit_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if element.tag_name.eq_ignore_ascii_case("button") {
        return element
            .attrs
            .get("type")
            .map(|kind| kind.eq_ignore_ascii_case("submit"))
            .unwrap_or(true);
    }

    if element.tag_name.eq_ignore_ascii_case("input") {
        return element
            .attrs
            .get("type")
            .map(|kind| kind.eq_ignore_ascii_case("submit") || kind.eq_ignore_ascii_case("image"))
            .unwrap_or(false);
    }

    false
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in input.chars().enumerate() {
        if count >= max_chars {
            out.push_str("...");
            return out;
        }
        out.push(ch);
    }
    out
}
