// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::DclareConfig;
use crate::engine::UniverseTransaction;
use crate::errors::SyncError;
use crate::model::{Action, Model, MutableClass, ObjectId, Observer, Setable, Value};
use crate::sync::{ChannelTransport, DefaultSerializationHelper, DeltaAdaptor, TcpTransport, UniverseSynchronizer};
use crate::traits::DeltaTransport;

/// Integration tests exchanging deltas between two universes
#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Arc<Model> {
        Arc::new(
            Model::builder("Catalog")
                .class(
                    MutableClass::new("Catalog")
                        .with_setable("items")
                        .with_setable("item_count")
                        .with_observer("count_items"),
                )
                .class(MutableClass::new("Item").with_setable("name"))
                .setable(Setable::new("items").default(Value::empty_set()).containment())
                .setable(Setable::new("item_count").default(Value::Int(0)))
                .setable(Setable::new("name"))
                .observer(Observer::new("count_items", |tx, catalog| {
                    let count = tx.children(catalog).len() as i64;
                    tx.set(catalog, "item_count", count)?;
                    Ok(())
                }))
                .build()
                .unwrap(),
        )
    }

    fn start() -> UniverseTransaction {
        UniverseTransaction::start(model(), DclareConfig::default().with_dev_mode(true), Action::noop("init"))
    }

    fn item(key: &str) -> ObjectId {
        ObjectId::new("Item", key)
    }

    fn add_item(key: &'static str, name: &'static str) -> Action {
        Action::new(format!("add_{}", key), move |tx| {
            let root = tx.root();
            tx.add(&root, "items", item(key))?;
            tx.set(&item(key), "name", name)?;
            Ok(())
        })
    }

    async fn eventually<F: Fn() -> bool>(condition: F) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn synchronized<T: DeltaTransport + 'static>(left: T, right: T) {
        let a = start();
        let b = start();
        a.wait_for_idle().await;
        b.wait_for_idle().await;

        let helper = Arc::new(DefaultSerializationHelper);
        let a_adaptor = DeltaAdaptor::attach(a.clone(), helper.clone());
        let b_adaptor = DeltaAdaptor::attach(b.clone(), helper);
        let token = CancellationToken::new();
        let a_sync = UniverseSynchronizer::spawn(a_adaptor, left, token.clone());
        let b_sync = UniverseSynchronizer::spawn(b_adaptor, right, token.clone());

        a.put_and_wait_for_idle(add_item("i1", "first")).await.unwrap();
        eventually(|| b.current_state().get(&item("i1"), &"name".into()) == Value::from("first")).await;

        let state = b.current_state();
        assert_eq!(state.parent(&item("i1")), Some(b.model().root()));
        assert_eq!(state.get(&b.model().root(), &"item_count".into()), Value::Int(1));

        b.put_and_wait_for_idle(add_item("i2", "second")).await.unwrap();
        eventually(|| a.current_state().get(&item("i2"), &"name".into()) == Value::from("second")).await;
        eventually(|| a.current_state() == b.current_state()).await;

        token.cancel();
        let a_summary = a_sync.await.unwrap().unwrap();
        let b_summary = b_sync.await.unwrap().unwrap();
        assert!(a_summary.sent >= 1);
        assert!(b_summary.received >= 1);
        assert!(a.errors().is_empty());
        assert!(b.errors().is_empty());
    }

    #[tokio::test]
    async fn test_universes_converge_over_channels() {
        let (left, right) = ChannelTransport::pair();
        synchronized(left, right).await;
    }

    #[tokio::test]
    async fn test_universes_converge_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let accepted = tokio::spawn(async move { listener.accept().await.map(|(stream, _)| stream) });

        let left = TcpTransport::connect(address).await.unwrap();
        let right = TcpTransport::from_stream(accepted.await.unwrap().unwrap()).unwrap();

        synchronized(left, right).await;
    }

    #[tokio::test]
    async fn test_delta_leaves_out_plumbing() {
        let universe = start();
        let adaptor = DeltaAdaptor::attach(universe.clone(), Arc::new(DefaultSerializationHelper));

        universe.put_and_wait_for_idle(add_item("i1", "first")).await.unwrap();

        let delta: serde_json::Value = serde_json::from_str(&adaptor.poll_delta().unwrap()).unwrap();
        assert_eq!(
            delta,
            json!({
                "Catalog:root": { "items": { "$set": [{ "$ref": "Item:i1" }] }, "item_count": 1 },
                "Item:i1": { "name": "first" },
            })
        );
        assert!(adaptor.poll_delta().is_none());
    }

    #[tokio::test]
    async fn test_applied_delta_is_not_echoed() {
        let universe = start();
        let adaptor = DeltaAdaptor::attach(universe.clone(), Arc::new(DefaultSerializationHelper));

        adaptor
            .accept(r#"{ "Catalog:root": { "items": { "$set": [{ "$ref": "Item:i9" }] }, "item_count": 1 }, "Item:i9": { "name": "remote" } }"#)
            .await
            .unwrap();
        let status = universe.wait_for_idle().await;

        assert_eq!(status.state.get(&item("i9"), &"name".into()), Value::from("remote"));
        assert!(adaptor.poll_delta().is_none());
    }

    #[tokio::test]
    async fn test_bad_deltas_are_rejected() {
        let universe = start();
        let adaptor = DeltaAdaptor::attach(universe.clone(), Arc::new(DefaultSerializationHelper));

        assert!(matches!(adaptor.accept("not json").await, Err(SyncError::Json(_))));
        assert!(matches!(adaptor.accept("[]").await, Err(SyncError::InvalidDelta(_))));
        assert!(matches!(
            adaptor.accept(r#"{ "Ghost:1": {} }"#).await,
            Err(SyncError::InvalidObjectId(_))
        ));
        assert!(matches!(
            adaptor.accept(r#"{ "Item:i1": { "$parent": null } }"#).await,
            Err(SyncError::UnknownSetable(_))
        ));
        assert!(universe.errors().is_empty());
    }
}
