use anyhow::Result;

use qbank_cli::config::{Config, Instance};

fn instance(name: &str) -> Instance {
    Instance {
        name: name.to_string(),
        base_url: format!("https://{name}.example.org"),
        username: "admin".to_string(),
        password: "district".to_string(),
    }
}

#[tokio::test]
async fn test_first_instance_becomes_current() -> Result<()> {
    let config = Config::new_test().await?;

    config.add_instance(instance("play")).await?;
    assert_eq!(config.get_current_instance().await?, Some("play".to_string()));

    // Later additions do not steal the flag
    config.add_instance(instance("staging")).await?;
    assert_eq!(config.get_current_instance().await?, Some("play".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_readding_current_instance_keeps_it_current() -> Result<()> {
    let config = Config::new_test().await?;

    config.add_instance(instance("play")).await?;
    config.add_instance(instance("staging")).await?;
    config.set_current_instance("staging").await?;

    // Re-register the selected instance with rotated credentials
    let mut updated = instance("staging");
    updated.password = "rotated".to_string();
    config.add_instance(updated).await?;

    assert_eq!(
        config.get_current_instance().await?,
        Some("staging".to_string())
    );
    let stored = config.get_instance("staging").await?.unwrap();
    assert_eq!(stored.password, "rotated");

    Ok(())
}

#[tokio::test]
async fn test_select_moves_the_current_flag() -> Result<()> {
    let config = Config::new_test().await?;

    config.add_instance(instance("play")).await?;
    config.add_instance(instance("staging")).await?;

    config.set_current_instance("staging").await?;
    assert_eq!(
        config.get_current_instance().await?,
        Some("staging".to_string())
    );

    // Exactly one instance carries the flag at a time
    let current: Vec<String> = config
        .list_instances()
        .await?
        .into_iter()
        .filter(|(_, _, is_current)| *is_current)
        .map(|(name, _, _)| name)
        .collect();
    assert_eq!(current, vec!["staging".to_string()]);

    assert!(config.set_current_instance("missing").await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_remove_instance() -> Result<()> {
    let config = Config::new_test().await?;

    config.add_instance(instance("play")).await?;
    config.delete_instance("play").await?;

    assert!(config.get_instance("play").await?.is_none());
    assert!(config.delete_instance("play").await.is_err());

    Ok(())
}
