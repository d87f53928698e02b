use lcu_plugin::config::PluginsConfig;
use lcu_plugin::plugins::DynPlugin;
use lcu_plugin::prelude::*;
use lcu_plugin::{PluginRegistry, PluginState};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

/// Subscribes to `ready` on connect, optionally after a delay.
struct Example {
    base: PluginBase<Self>,
    delay_ms: Option<u64>,
    ready_count: u32,
    summoner: Option<String>,
}

impl Example {
    fn new() -> lcu_plugin::Result<Self> {
        Ok(Self {
            base: PluginBase::new("Example")?,
            delay_ms: None,
            ready_count: 0,
            summoner: None,
        })
    }

    fn delayed(ms: u64) -> lcu_plugin::Result<Self> {
        let mut plugin = Self::new()?;
        plugin.delay_ms = Some(ms);
        Ok(plugin)
    }

    fn on_ready(&mut self, event: &Event) -> anyhow::Result<()> {
        self.ready_count += 1;
        self.log(format!("ready #{} ({})", self.ready_count, event.data));
        Ok(())
    }
}

#[async_trait]
impl Plugin for Example {
    fn base(&self) -> &PluginBase<Self> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PluginBase<Self> {
        &mut self.base
    }

    async fn on_connect(&mut self, client: &ClientData) -> Result<()> {
        if let Some(ms) = self.delay_ms {
            self.sleep(ms).await;
        }
        self.summoner = client
            .as_value()
            .get("summoner")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        self.subscribe_event("ready", Example::on_ready);
        self.subscribe_event("/lol-gameflow/v1/gameflow-phase", |p: &mut Example, e| {
            p.log(format!("phase {}", e.data));
            Ok(())
        });
        Ok(())
    }

    async fn on_close(&mut self) -> Result<()> {
        for event in self.subscribed_events() {
            self.unsubscribe_event(&event);
        }
        Ok(())
    }
}

#[test]
fn abstract_name_cannot_be_instantiated() {
    let err = PluginBase::<Example>::new("PluginBase").unwrap_err();
    assert!(matches!(err, PluginError::Instantiation(_)));
    assert!(Example::new().is_ok());
}

#[tokio::test]
async fn synchronous_connect_subscribes_immediately() {
    let mut plugin = Example::new().unwrap();
    assert!(plugin.subscribed_events().is_empty());

    plugin
        .on_connect(&ClientData::new(json!({ "summoner": "Faker" })))
        .await
        .unwrap();

    assert!(plugin.is_subscribed("ready"));
    assert_eq!(plugin.summoner.as_deref(), Some("Faker"));

    assert!(plugin.handle_event(&Event::new("ready", json!(1))).unwrap());
    assert!(plugin.handle_event(&Event::new("ready", json!(2))).unwrap());
    assert_eq!(plugin.ready_count, 2);
}

#[tokio::test(start_paused = true)]
async fn delayed_connect_subscribes_only_after_settling() {
    let mut plugin = Example::delayed(50).unwrap();
    let client = ClientData::default();
    let start = Instant::now();

    let mut connecting = plugin.on_connect(&client);
    tokio::select! {
        biased;
        _ = &mut connecting => panic!("on_connect settled before its sleep elapsed"),
        _ = tokio::time::sleep(Duration::from_millis(10)) => {}
    }
    connecting.await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(plugin.is_subscribed("ready"));
}

#[tokio::test]
async fn close_empties_subscriptions() {
    let mut plugin = Example::new().unwrap();
    plugin.on_connect(&ClientData::default()).await.unwrap();
    assert_eq!(plugin.subscribed_events().len(), 2);

    plugin.on_close().await.unwrap();
    assert!(plugin.subscribed_events().is_empty());
    assert!(!plugin.handle_event(&Event::new("ready", json!(null))).unwrap());
}

#[tokio::test]
async fn promise_handler_runs_with_plugin() {
    let plugin = Example::new().unwrap();

    let name = plugin
        .create_promise(|p: &Example, settle| settle.resolve(p.name().to_string()))
        .await
        .unwrap();
    assert_eq!(name, "Example");

    let rejected: lcu_plugin::Result<()> = plugin
        .create_promise(|_, settle: Settle<()>| {
            tokio::spawn(async move { settle.reject(anyhow::anyhow!("client went away")) });
        })
        .await;
    assert!(matches!(rejected, Err(PluginError::Rejected(_))));
}

#[tokio::test]
async fn registry_drives_full_lifecycle() {
    let mut registry = PluginRegistry::new(&PluginsConfig::default());
    registry.register(Example::delayed(5).unwrap()).unwrap();
    assert_eq!(registry.state("Example"), Some(PluginState::Constructed));

    let failed = registry.connect_all(&ClientData::default()).await;
    assert!(failed.is_empty());
    assert_eq!(registry.state("Example"), Some(PluginState::Connected));
    assert_eq!(registry.subscribers("ready"), vec!["Example"]);

    let plugin = registry.get_mut("Example").unwrap();
    let phase = Event::new("/lol-gameflow/v1/gameflow-phase", json!("Lobby"));
    assert!(plugin.dyn_handle_event(&phase).unwrap());

    let failed = registry.close_all().await;
    assert!(failed.is_empty());
    assert_eq!(registry.state("Example"), Some(PluginState::Closed));
    assert_eq!(registry.subscriptions("Example"), Some(Vec::new()));
}
