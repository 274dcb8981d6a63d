//! Plugin Error Types
//!
//! Error taxonomy for registration, lookup, validation and dispatch.

use thiserror::Error;

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors raised by the plugin runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    /// A plugin with the same id already exists in the partition
    #[error("Plugin '{plugin_id}' is already registered as a {plugin_type} plugin")]
    DuplicateId { plugin_id: String, plugin_type: String },

    /// Malformed plugin definition
    #[error("Invalid plugin definition: {message}")]
    ValidationError { message: String },

    /// Plugin not found
    #[error("Plugin not found: {plugin_id}")]
    PluginNotFound { plugin_id: String },

    /// Function not found on an existing plugin
    #[error("Function '{function_name}' not found in plugin '{plugin_id}'")]
    FunctionNotFound { plugin_id: String, function_name: String },

    /// Parameters do not satisfy the declared schema
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// Qualified name is not of the form `pluginId.functionName`
    #[error("Invalid function call format '{qualified_name}': expected 'pluginId.functionName'")]
    InvalidCallFormat { qualified_name: String },

    /// Admission controller refused the execution
    #[error("Execution denied: {reason}")]
    ExecutionDenied { reason: String },

    /// The executor backing a function failed
    #[error("Executor for '{plugin_id}.{function_name}' failed: {message}")]
    ExecutorError { plugin_id: String, function_name: String, message: String },

    /// Plugin exists but has been disabled
    #[error("Plugin is disabled: {plugin_id}")]
    PluginDisabled { plugin_id: String },

    /// Release of an execution token that is not in flight
    #[error("Unknown or already released execution: {execution_id}")]
    UnknownExecution { execution_id: String },

    /// Plugin manifest could not be read or parsed
    #[error("Plugin manifest error: {message}")]
    ManifestError { message: String },

    /// Configuration error
    #[error("Plugin configuration error: {message}")]
    ConfigurationError { message: String },
}

impl PluginError {
    /// Create a duplicate id error
    pub fn duplicate_id<S: Into<String>, T: Into<String>>(plugin_id: S, plugin_type: T) -> Self {
        Self::DuplicateId { plugin_id: plugin_id.into(), plugin_type: plugin_type.into() }
    }

    /// Create a definition validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::ValidationError { message: message.into() }
    }

    /// Create a plugin not found error
    pub fn plugin_not_found<S: Into<String>>(plugin_id: S) -> Self {
        Self::PluginNotFound { plugin_id: plugin_id.into() }
    }

    /// Create a function not found error
    pub fn function_not_found<S: Into<String>, T: Into<String>>(plugin_id: S, function_name: T) -> Self {
        Self::FunctionNotFound { plugin_id: plugin_id.into(), function_name: function_name.into() }
    }

    /// Create an invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters { message: message.into() }
    }

    /// Create an invalid call format error
    pub fn invalid_call_format<S: Into<String>>(qualified_name: S) -> Self {
        Self::InvalidCallFormat { qualified_name: qualified_name.into() }
    }

    /// Create an execution denied error
    pub fn execution_denied<S: Into<String>>(reason: S) -> Self {
        Self::ExecutionDenied { reason: reason.into() }
    }

    /// Create an executor error
    pub fn executor_error<P, F, M>(plugin_id: P, function_name: F, message: M) -> Self
    where
        P: Into<String>,
        F: Into<String>,
        M: Into<String>,
    {
        Self::ExecutorError {
            plugin_id: plugin_id.into(),
            function_name: function_name.into(),
            message: message.into(),
        }
    }

    /// Create a plugin disabled error
    pub fn plugin_disabled<S: Into<String>>(plugin_id: S) -> Self {
        Self::PluginDisabled { plugin_id: plugin_id.into() }
    }

    /// Create an unknown execution error
    pub fn unknown_execution<S: Into<String>>(execution_id: S) -> Self {
        Self::UnknownExecution { execution_id: execution_id.into() }
    }

    /// Create a manifest error
    pub fn manifest_error<S: Into<String>>(message: S) -> Self {
        Self::ManifestError { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Errors raised while resolving a plugin or function
    pub fn is_lookup_error(&self) -> bool {
        matches!(self,
            PluginError::PluginNotFound { .. } |
            PluginError::FunctionNotFound { .. } |
            PluginError::InvalidCallFormat { .. }
        )
    }

    /// Errors caused by malformed definitions or parameters
    pub fn is_validation_error(&self) -> bool {
        matches!(self,
            PluginError::ValidationError { .. } |
            PluginError::InvalidParameters { .. } |
            PluginError::DuplicateId { .. } |
            PluginError::ManifestError { .. }
        )
    }

    /// Errors raised after validation, once admission was attempted
    pub fn is_execution_error(&self) -> bool {
        matches!(self,
            PluginError::ExecutionDenied { .. } |
            PluginError::ExecutorError { .. }
        )
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        PluginError::manifest_error(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for PluginError {
    fn from(err: serde_yaml::Error) -> Self {
        PluginError::manifest_error(format!("YAML error: {}", err))
    }
}
