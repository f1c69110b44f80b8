use allowance_rpc::{
    resolve_endpoint, EndpointResolverParams, EndpointState, EndpointWalk, ProbeFailure,
};
use allowance_test::{init_test_logging, MockEndpoint, MockNetwork};
use std::time::{Duration, Instant};

fn urls(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("http://node-{i}.test")).collect()
}

fn params(probe_ms: u64) -> EndpointResolverParams {
    EndpointResolverParams {
        probe_timeout: Duration::from_millis(probe_ms),
        resolve_deadline: None,
    }
}

///First two endpoints are broken in different ways, third one answers,
///fourth one must never be touched.
#[tokio::test(flavor = "multi_thread")]
async fn test_first_healthy_endpoint_wins() -> Result<(), anyhow::Error> {
    init_test_logging();
    let endpoints = urls(4);
    let network = MockNetwork::new()
        .with_endpoint(&endpoints[0], MockEndpoint::hanging())
        .with_endpoint(&endpoints[1], MockEndpoint::failing("header not found"))
        .with_endpoint(&endpoints[2], MockEndpoint::healthy(1234))
        .with_endpoint(&endpoints[3], MockEndpoint::healthy(1235));

    let connection = resolve_endpoint(&network, &endpoints, &params(100))
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    assert_eq!(connection.index, 2);
    assert_eq!(connection.endpoint, endpoints[2]);
    assert_eq!(connection.block_number, 1234);
    assert_eq!(network.connect_log(), endpoints[0..3].to_vec());
    assert_eq!(network.connect_count(&endpoints[3]), 0);
    assert!(network.requests_to(&endpoints[3]).is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_endpoints_failed() -> Result<(), anyhow::Error> {
    init_test_logging();
    let endpoints = urls(4);
    let network = MockNetwork::new()
        .with_endpoint(&endpoints[0], MockEndpoint::hanging())
        .with_endpoint(&endpoints[1], MockEndpoint::failing("rate limited"))
        .with_endpoint(&endpoints[2], MockEndpoint::hanging())
        .with_endpoint(&endpoints[3], MockEndpoint::failing("bad gateway"));

    let err = match resolve_endpoint(&network, &endpoints, &params(50)).await {
        Ok(connection) => anyhow::bail!("unexpected connection to {}", connection.endpoint),
        Err(err) => err,
    };

    assert_eq!(err.attempts.len(), 4);
    assert_eq!(err.attempts[0].failure, ProbeFailure::Unreachable);
    assert!(matches!(err.attempts[1].failure, ProbeFailure::RpcError(_)));
    assert_eq!(err.attempts[2].failure, ProbeFailure::Unreachable);
    assert_eq!(
        err.attempts.iter().map(|a| a.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(network.connect_log(), endpoints);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_error_moves_to_next_endpoint() -> Result<(), anyhow::Error> {
    let endpoints = urls(2);
    //first url is not known to the network, so connecting fails
    let network = MockNetwork::new().with_endpoint(&endpoints[1], MockEndpoint::healthy(7));

    let connection = resolve_endpoint(&network, &endpoints, &params(100))
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(connection.index, 1);
    assert_eq!(network.connect_log(), endpoints);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_endpoint_list() -> Result<(), anyhow::Error> {
    let network = MockNetwork::new();
    let res = resolve_endpoint(&network, &[], &params(100)).await;
    assert!(res.is_err());
    assert!(network.connect_log().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deadline_bounds_the_walk() -> Result<(), anyhow::Error> {
    let endpoints = urls(5);
    let mut network = MockNetwork::new();
    for endpoint in &endpoints {
        network = network.with_endpoint(endpoint, MockEndpoint::hanging());
    }
    let params = EndpointResolverParams {
        probe_timeout: Duration::from_millis(100),
        resolve_deadline: Some(Duration::from_millis(150)),
    };

    let started = Instant::now();
    let err = match resolve_endpoint(&network, &endpoints, &params).await {
        Ok(_) => anyhow::bail!("hanging endpoints cannot be healthy"),
        Err(err) => err,
    };
    assert!(started.elapsed() < Duration::from_millis(450));
    assert_eq!(
        err.attempts.last().map(|a| a.failure.clone()),
        Some(ProbeFailure::DeadlineReached)
    );
    assert!(network.connect_log().len() < endpoints.len());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_machine_steps() -> Result<(), anyhow::Error> {
    let endpoints = urls(2);
    let network = MockNetwork::new()
        .with_endpoint(&endpoints[0], MockEndpoint::failing("boom"))
        .with_endpoint(&endpoints[1], MockEndpoint::healthy(99));

    let mut walk = EndpointWalk::new(&network, &endpoints, &params(100));
    let state = walk.start();
    assert!(matches!(state, EndpointState::Untried { idx: 0 }));

    let state = walk.step(state).await;
    assert!(matches!(state, EndpointState::Probing { idx: 0, .. }));

    let state = walk.step(state).await;
    assert!(matches!(state, EndpointState::Failed { idx: 0, .. }));
    assert!(walk.attempts().is_empty());

    let state = walk.step(state).await;
    assert!(matches!(state, EndpointState::Untried { idx: 1 }));
    assert_eq!(walk.attempts().len(), 1);

    let state = walk.step(state).await;
    let state = walk.step(state).await;
    assert!(state.is_terminal());
    match state {
        EndpointState::Healthy(connection) => assert_eq!(connection.block_number, 99),
        other => anyhow::bail!("expected healthy endpoint, got {other:?}"),
    }
    Ok(())
}
