//! Event enrichment.
//!
//! Builds the stored [`EventEnvelope`] for one tracking call in four stages,
//! each overriding the previous one:
//!
//! 1. caller params decoded by wire key
//! 2. identity and context (kind, page, component, environment, timestamp, ...)
//! 3. error fields
//! 4. device fields

use std::collections::HashMap;
use std::sync::Arc;

use insights_core::{Actor, Clock, ErrorInfo, EventEnvelope, EventFields, EventKind};
use insights_settings::{EventDefaults, InsightsSettings};
use tracing::warn;

use crate::device::DeviceInfoProvider;

/// One tracking call as queued for the worker.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackRequest {
    /// Event kind.
    pub kind: EventKind,
    /// Page or screen being viewed.
    pub page_name: String,
    /// Group the page belongs to.
    pub page_group: String,
    /// Clicked link; `None` clears any caller-supplied `link`.
    pub link: Option<String>,
    /// Loosely typed caller fields keyed by wire name.
    pub params: Option<HashMap<String, String>>,
    /// Error details for error events.
    pub error: Option<ErrorInfo>,
}

impl TrackRequest {
    /// A click on `link`.
    pub fn click(
        page_name: impl Into<String>,
        page_group: impl Into<String>,
        link: impl Into<String>,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            kind: EventKind::Click,
            page_name: page_name.into(),
            page_group: page_group.into(),
            link: Some(link.into()),
            params: Some(params),
            error: None,
        }
    }

    /// A page impression.
    pub fn impression(
        page_name: impl Into<String>,
        page_group: impl Into<String>,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            kind: EventKind::Impression,
            page_name: page_name.into(),
            page_group: page_group.into(),
            link: None,
            params: Some(params),
            error: None,
        }
    }

    /// An error shown on a page.
    pub fn error(
        page_name: impl Into<String>,
        page_group: impl Into<String>,
        error: ErrorInfo,
    ) -> Self {
        Self {
            kind: EventKind::Error,
            page_name: page_name.into(),
            page_group: page_group.into(),
            link: None,
            params: None,
            error: Some(error),
        }
    }
}

/// Turns [`TrackRequest`]s into envelopes for one visit.
pub struct EventEnricher {
    actor: Actor,
    environment: String,
    program_token: String,
    sdk_version: String,
    defaults: EventDefaults,
    device: Arc<dyn DeviceInfoProvider>,
    clock: Arc<dyn Clock>,
}

impl EventEnricher {
    /// Enricher for `visit_id`, taking identity values from `settings`.
    pub fn new(
        settings: &InsightsSettings,
        visit_id: impl Into<String>,
        device: Arc<dyn DeviceInfoProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            actor: Actor::new(visit_id, settings.user_token.clone()),
            environment: settings.environment.clone(),
            program_token: settings.program_token.clone(),
            sdk_version: settings.sdk_version.clone(),
            defaults: settings.event_defaults.clone(),
            device,
            clock,
        }
    }

    /// Visit id stamped on every envelope.
    pub fn visit_id(&self) -> &str {
        &self.actor.visit_id
    }

    /// Build the envelope for `request`.
    pub fn enrich(&self, request: &TrackRequest) -> EventEnvelope {
        let mut fields = caller_fields(request.params.as_ref());
        self.apply_generic(request, &mut fields);
        if let Some(error) = &request.error {
            apply_error(error, &mut fields);
        }
        self.apply_device(&mut fields);
        EventEnvelope::single(self.actor.clone(), fields)
    }

    fn apply_generic(&self, request: &TrackRequest, fields: &mut EventFields) {
        fields.event_type = Some(request.kind.as_str().to_string());
        fields.page_name = Some(request.page_name.clone());
        fields.page_group = Some(request.page_group.clone());
        fields.link.clone_from(&request.link);
        fields.component = Some(self.defaults.component.clone());
        fields.hyperwallet_environment = Some(self.environment.clone());
        fields.hyperwallet_is = Some(self.program_token.clone());
        fields.operating_system = Some(self.defaults.operating_system.clone());
        fields.page_technology_flag = Some(self.defaults.framework_flag.clone());
        fields.sdk_version = Some(self.sdk_version.clone());
        if fields.product.is_none() {
            fields.product = Some(self.defaults.product.clone());
        }
        if fields.tenent_name.is_none() {
            fields.tenent_name = Some(self.defaults.tenant_name.clone());
        }
        fields.timestamp = Some(self.clock.now_ms());
    }

    fn apply_device(&self, fields: &mut EventFields) {
        let device = self.device.device_info();
        fields.device_model = Some(device.model);
        fields.device_name = Some(device.name);
        fields.device_type = Some(device.device_type.as_str().to_string());
        fields.orientation = Some(device.orientation.as_str().to_string());
        fields.screen_height = Some(device.screen_height);
        fields.screen_width = Some(device.screen_width);
        fields.operating_system_version = Some(device.os_version);
        fields.rosetta_language = Some(device.language);
    }
}

fn caller_fields(params: Option<&HashMap<String, String>>) -> EventFields {
    let Some(params) = params else {
        return EventFields::default();
    };
    match EventFields::from_caller_params(params) {
        Ok(fields) => fields,
        Err(error) => {
            warn!(%error, keys = params.len(), "discarding malformed event params");
            EventFields::default()
        }
    }
}

fn apply_error(error: &ErrorInfo, fields: &mut EventFields) {
    fields.error_type = Some(error.error_type.clone());
    fields.error_message = Some(error.message.clone());
    fields.error_field_name = Some(error.field_name.clone());
    fields.error_description = Some(error.description.clone());
    fields.error_code = Some(error.code.clone());
}
