use allowance_lib::batch::{resolve_batch, BatchRequest};
use allowance_lib::config::{ChainId, ResolverSettings};
use allowance_lib::resolver::AllowanceResolver;
use allowance_test::{
    bsc_endpoints, create_test_registry, create_test_settings, eth_endpoints, holder, holder_str,
    init_test_logging, token_amount, CallBehavior, MockEndpoint, MockNetwork,
};
use std::time::{Duration, Instant};

fn healthy_network(latency: Duration) -> MockNetwork {
    MockNetwork::new()
        .with_endpoint(
            &bsc_endpoints(1)[0],
            MockEndpoint::healthy(100)
                .with_latency(latency)
                .with_default_call(CallBehavior::Amount(token_amount(3, 18))),
        )
        .with_endpoint(
            &eth_endpoints(1)[0],
            MockEndpoint::healthy(200)
                .with_latency(latency)
                .with_default_call(CallBehavior::Amount(token_amount(2, 6))),
        )
}

fn mixed_requests(count: u64) -> Vec<BatchRequest> {
    (0..count)
        .map(|no| {
            let chain = if no % 2 == 0 {
                ChainId::Bsc
            } else {
                ChainId::Eth
            };
            BatchRequest::new(&holder_str(no), chain)
        })
        .collect()
}

///12 addresses on mixed chains go out in waves of 5, 5 and 2
#[tokio::test(flavor = "multi_thread")]
async fn test_twelve_addresses_three_waves() -> Result<(), anyhow::Error> {
    init_test_logging();
    let network = healthy_network(Duration::from_millis(20));
    let resolver = AllowanceResolver::new(
        create_test_registry(1),
        create_test_settings(),
        network.clone(),
    );
    let requests = mixed_requests(12);

    let batch = resolve_batch(&resolver, &requests).await;

    assert_eq!(batch.waves(), 3);
    assert_eq!(batch.wave_sizes, vec![5, 5, 2]);
    assert_eq!(batch.results.len(), 12);
    for request in &requests {
        let result = batch
            .get(&request.address)
            .ok_or(anyhow::anyhow!("missing {}", request.address))?;
        assert_eq!(result.chain, request.chain);
        assert_eq!(result.error(), None);
        let expected = match request.chain {
            ChainId::Bsc => "3.00",
            ChainId::Eth => "2.00",
        };
        assert_eq!(result.available(), expected);
    }
    assert!(network.peak_in_flight() <= 5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wave_count_is_ceil_of_batch_size() -> Result<(), anyhow::Error> {
    let network = healthy_network(Duration::ZERO);
    for (count, batch_size, waves) in [(0, 5, 0), (1, 5, 1), (5, 5, 1), (6, 5, 2), (7, 3, 3)] {
        let settings = ResolverSettings {
            batch_size,
            ..create_test_settings()
        };
        let resolver = AllowanceResolver::new(create_test_registry(1), settings, network.clone());
        let batch = resolve_batch(&resolver, &mixed_requests(count)).await;
        assert_eq!(batch.waves(), waves, "{count} requests, batch size {batch_size}");
        assert_eq!(batch.results.len(), count as usize);
    }
    Ok(())
}

///ETH is completely down while BSC answers, BSC results stay correct
#[tokio::test(flavor = "multi_thread")]
async fn test_failed_chain_does_not_affect_others() -> Result<(), anyhow::Error> {
    init_test_logging();
    let network = MockNetwork::new()
        .with_endpoint(
            &bsc_endpoints(1)[0],
            MockEndpoint::healthy(100)
                .with_default_call(CallBehavior::Amount(token_amount(3, 18)))
                .with_allowance(holder(4), CallBehavior::Amount(token_amount(1, 18))),
        )
        .with_endpoint(&eth_endpoints(1)[0], MockEndpoint::failing("service unavailable"));
    let resolver = AllowanceResolver::new(
        create_test_registry(1),
        create_test_settings(),
        network.clone(),
    );

    let mut requests = mixed_requests(8);
    requests.push(BatchRequest::new("0xnot-an-address", ChainId::Bsc));
    let batch = resolve_batch(&resolver, &requests).await;

    assert_eq!(batch.results.len(), 9);
    for no in 0..8 {
        let result = batch
            .get(&holder_str(no))
            .ok_or(anyhow::anyhow!("missing holder {no}"))?;
        if no % 2 == 0 {
            assert_eq!(result.error(), None);
            let expected = if no == 4 { "1.00" } else { "3.00" };
            assert_eq!(result.available(), expected);
        } else {
            assert_eq!(result.error(), Some("All ETH RPC endpoints failed"));
            assert_eq!(result.balance(), "0");
            assert_eq!(result.available(), "0");
        }
    }
    let invalid = batch
        .get("0xnot-an-address")
        .ok_or(anyhow::anyhow!("missing invalid address"))?;
    assert!(invalid.error().unwrap_or_default().contains("Invalid address"));

    let summary = batch.summary();
    assert_eq!(summary[&ChainId::Bsc].resolved, 4);
    assert_eq!(summary[&ChainId::Bsc].failed, 1);
    assert_eq!(summary[&ChainId::Eth].failed, 4);
    Ok(())
}

///Wave i + 1 starts only after every lookup of wave i is finished
#[tokio::test(flavor = "multi_thread")]
async fn test_waves_are_sequential() -> Result<(), anyhow::Error> {
    let latency = Duration::from_millis(50);
    let network = healthy_network(latency);
    let resolver = AllowanceResolver::new(
        create_test_registry(1),
        create_test_settings(),
        network.clone(),
    );

    let started = Instant::now();
    let batch = resolve_batch(&resolver, &mixed_requests(15)).await;

    assert_eq!(batch.waves(), 3);
    //every lookup is a probe followed by reads, each costing `latency`
    assert!(started.elapsed() >= latency * 2 * 3);
    assert!(network.peak_in_flight() <= 5);
    assert!(network.peak_in_flight() >= 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicates_are_collapsed() -> Result<(), anyhow::Error> {
    let network = healthy_network(Duration::ZERO);
    let resolver = AllowanceResolver::new(
        create_test_registry(1),
        create_test_settings(),
        network.clone(),
    );
    let requests = vec![
        BatchRequest::new(&holder_str(1), ChainId::Bsc),
        BatchRequest::new(&holder_str(2), ChainId::Eth),
        BatchRequest::new(&format!(" {} ", holder_str(1)), ChainId::Eth),
    ];

    let batch = resolve_batch(&resolver, &requests).await;

    assert_eq!(batch.results.len(), 2);
    assert_eq!(batch.wave_sizes, vec![2]);
    let first = batch
        .get(&holder_str(1))
        .ok_or(anyhow::anyhow!("missing holder"))?;
    assert_eq!(first.chain, ChainId::Bsc);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wave_interval_spaces_waves() -> Result<(), anyhow::Error> {
    let network = healthy_network(Duration::ZERO);
    let settings = ResolverSettings {
        batch_size: 2,
        wave_interval: Some(0.1),
        ..create_test_settings()
    };
    let resolver = AllowanceResolver::new(create_test_registry(1), settings, network.clone());

    let started = Instant::now();
    let batch = resolve_batch(&resolver, &mixed_requests(6)).await;

    assert_eq!(batch.waves(), 3);
    assert!(started.elapsed() >= Duration::from_millis(180));
    Ok(())
}
