use std::time::Duration;
use zelect_core::InstanceId;

/// Configuration for one election participant.
#[derive(Debug, Clone)]
pub struct ElectionConfig {
    /// Address of the coordination service
    pub address: String,
    /// Shared namespace holding every candidate's election entry
    pub election_path: String,
    /// This instance's identifier (observability only)
    pub instance_id: InstanceId,
    /// Session timeout negotiated with the coordination service; the service
    /// declares the session dead after this long without heartbeats
    pub session_timeout: Duration,
    /// Upper bound on establishing the initial connection
    pub connect_timeout: Duration,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            address: "localhost:2181".to_string(),
            election_path: "/election".to_string(),
            instance_id: InstanceId::new(format!("instance-{}", std::process::id())),
            session_timeout: Duration::from_millis(3000),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ElectionConfig {
    pub fn new(election_path: impl Into<String>, instance_id: impl Into<InstanceId>) -> Self {
        Self {
            election_path: election_path.into(),
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
