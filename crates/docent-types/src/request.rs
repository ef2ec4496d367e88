//! Inbound request: the raw wire body and its validated form.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::tool::{Parameters, ToolInvocation, ToolType};

/// Tool invocation as it arrives on the wire, before the tool type is checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInvocationBody {
    pub tool_type: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl TryFrom<ToolInvocationBody> for ToolInvocation {
    type Error = ValidationError;

    fn try_from(body: ToolInvocationBody) -> Result<Self> {
        Ok(ToolInvocation {
            tool_type: body.tool_type.parse::<ToolType>()?,
            parameters: body.parameters,
        })
    }
}

/// Unvalidated request body.
///
/// Also serves as the builder for [`McpRequest`]:
///
/// ```
/// use docent_types::McpRequestBody;
///
/// let request = McpRequestBody::new("What does travel insurance cover?")
///     .with_temperature(0.3)
///     .validate()
///     .unwrap();
/// assert_eq!(request.question(), "What does travel insurance cover?");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpRequestBody {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub tools: Vec<ToolInvocationBody>,
}

impl McpRequestBody {
    /// Start a request body with the given question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Continue an existing session.
    pub fn with_session_id(mut self, id: Uuid) -> Self {
        self.session_id = Some(id.to_string());
        self
    }

    /// Set the generation temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Append an explicit tool invocation.
    pub fn with_tool(mut self, invocation: ToolInvocation) -> Self {
        self.tools.push(ToolInvocationBody {
            tool_type: invocation.tool_type.as_str().to_string(),
            parameters: invocation.parameters,
        });
        self
    }

    /// Validate into an [`McpRequest`].
    pub fn validate(self) -> Result<McpRequest> {
        McpRequest::try_from(self)
    }
}

/// A validated inbound turn.
///
/// Only obtainable through validation, so holding one guarantees a
/// non-empty question, an in-range temperature, and known tool types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "McpRequestBody")]
pub struct McpRequest {
    question: String,
    session_id: Option<Uuid>,
    temperature: Option<f64>,
    tools: Vec<ToolInvocation>,
}

impl McpRequest {
    /// The user's question, trimmed.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Session the caller wants to continue, if any.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Requested generation temperature.
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Explicit tool invocations, in caller order.
    pub fn tools(&self) -> &[ToolInvocation] {
        &self.tools
    }
}

impl TryFrom<McpRequestBody> for McpRequest {
    type Error = ValidationError;

    fn try_from(body: McpRequestBody) -> Result<Self> {
        let question = body.question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }

        if let Some(t) = body.temperature
            && !(0.0..=1.0).contains(&t)
        {
            return Err(ValidationError::TemperatureOutOfRange(t));
        }

        let tools = body
            .tools
            .into_iter()
            .map(ToolInvocation::try_from)
            .collect::<Result<Vec<_>>>()?;

        // A malformed id cannot name a live session; treat it as absent.
        let session_id = body.session_id.as_deref().and_then(|raw| {
            let parsed = Uuid::parse_str(raw).ok();
            if parsed.is_none() {
                debug!(session_id = raw, "Ignoring malformed session id");
            }
            parsed
        });

        Ok(McpRequest {
            question: question.to_string(),
            session_id,
            temperature: body.temperature,
            tools,
        })
    }
}
