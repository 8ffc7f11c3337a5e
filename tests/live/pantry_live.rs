use pantry_client::{CancellationToken, Config, PantryClient};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Test {
    name: String,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn should_run_live() -> bool {
    matches!(env_var("LIVE_API_TESTS").as_deref(), Some("1")) && env_var("PANTRY_API_KEY").is_some()
}

#[ignore]
#[tokio::test]
async fn live_basket_lifecycle() -> anyhow::Result<()> {
    if !should_run_live() {
        eprintln!("skipping live test: LIVE_API_TESTS!=1 or PANTRY_API_KEY missing");
        return Ok(());
    }
    let client = PantryClient::new(Config::from_env()?)?;
    let cancel = CancellationToken::new();
    let basket = "pantry-client-live-test";
    let data = Test {
        name: "test".into(),
    };

    assert!(client.create_or_replace_basket(basket, &data, &cancel).await?);
    assert!(client.has_basket(basket, &cancel).await?);
    let fetched: Test = client.get_basket_content(basket, &cancel).await?;
    assert_eq!(fetched, data);
    assert!(client.delete_basket(basket, &cancel).await?);
    Ok(())
}
