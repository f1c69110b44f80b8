mod connector;
mod endpoint;
mod query;

pub use connector::{HttpConnector, Web3Connector};
pub use endpoint::{
    probe_endpoint, resolve_endpoint, AllEndpointsFailed, EndpointConnection, EndpointResolverParams,
    EndpointState, EndpointWalk, ProbeAttempt, ProbeFailure, ProbeStatus,
};
pub use query::{call_uint, execute_query, QueryDescriptor, UINT_RESPONSE_LEN};
