// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use dclare::config::{load_and_validate_config, DclareConfig};
use dclare::engine::UniverseTransaction;
use dclare::errors::RuleError;
use dclare::model::{Action, Constant, Model, MutableClass, ObjectId, Observer, Setable, Value};
use dclare::state::State;
use tracing_subscriber::EnvFilter;

/// A small shop: orders with lines, a derived order total, customers who own
/// orders through an opposite pair and a memoized Fibonacci constant.
fn shop_model() -> Result<Model> {
    Model::builder("Shop")
        .class(
            MutableClass::new("Shop")
                .with_setable("orders")
                .with_setable("customers")
                .with_setable("lucky_number")
                .with_setable("lucky_value")
                .with_observer("lucky"),
        )
        .class(
            MutableClass::new("Order")
                .with_setable("lines")
                .with_setable("total")
                .with_setable("customer")
                .with_observer("order_total"),
        )
        .class(MutableClass::new("Line").with_setable("qty").with_setable("price"))
        .class(MutableClass::new("Customer").with_setable("orders_placed"))
        .setable(Setable::new("orders").default(Value::empty_set()).containment())
        .setable(Setable::new("customers").default(Value::empty_set()).containment())
        .setable(Setable::new("lines").default(Value::empty_set()).containment())
        .setable(Setable::new("total").default(Value::Int(0)))
        .setable(Setable::new("qty").default(Value::Int(0)))
        .setable(Setable::new("price").default(Value::Int(0)))
        .setable(Setable::new("customer").opposite("orders_placed"))
        .setable(Setable::new("orders_placed").default(Value::empty_set()).opposite("customer"))
        .setable(Setable::new("lucky_number"))
        .setable(Setable::new("lucky_value"))
        .observer(Observer::new("order_total", |tx, order| {
            let mut total = 0;
            for line in tx.children(order) {
                total += tx.get_int(&line, "qty")? * tx.get_int(&line, "price")?;
            }
            tx.set(order, "total", total)?;
            Ok(())
        }))
        .observer(Observer::new("lucky", |tx, shop| {
            let value = match tx.get(shop, "lucky_number").as_int() {
                Some(n) => tx.constant("fibonacci", n)?,
                None => Value::Null,
            };
            tx.set(shop, "lucky_value", value)?;
            Ok(())
        }))
        .constant(Constant::new("fibonacci", |ctx, n| {
            let n = n
                .as_int()
                .ok_or_else(|| RuleError::failed("fibonacci needs an integer"))?;
            if n < 2 {
                return Ok(Value::Int(n));
            }
            let a = ctx.get("fibonacci", n - 1)?.as_int().unwrap_or(0);
            let b = ctx.get("fibonacci", n - 2)?.as_int().unwrap_or(0);
            Ok(Value::Int(a + b))
        }))
        .build()
        .map_err(|errors| {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow!("invalid model: {}", details.join("; "))
        })
}

fn order(key: &str) -> ObjectId {
    ObjectId::new("Order", key)
}

fn line(key: &str) -> ObjectId {
    ObjectId::new("Line", key)
}

fn customer(key: &str) -> ObjectId {
    ObjectId::new("Customer", key)
}

fn print_diff(title: &str, before: &State, after: &State) {
    println!("\n🔄 {}", title);
    let diff = before.diff_string(after);
    if diff.is_empty() {
        println!("   (no changes)");
    }
    for change in diff.lines() {
        println!("   {}", change);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => load_and_validate_config(path).with_context(|| format!("loading {}", path))?,
        None => DclareConfig::from_env(),
    };

    println!("🚀 dclare shop demo");
    println!("═══════════════════");
    println!("Dev mode: {}", config.dev_mode);
    println!("Queue capacity: {}", config.max_in_in_queue());

    let model = Arc::new(shop_model()?);
    let started = Instant::now();
    let universe = UniverseTransaction::start(
        Arc::clone(&model),
        config,
        Action::new("open_shop", |tx| {
            let root = tx.root();
            tx.add(&root, "customers", customer("ada"))?;
            tx.add(&root, "customers", customer("linus"))?;
            tx.add(&root, "orders", order("o1"))?;
            tx.add(&order("o1"), "lines", line("l1"))?;
            tx.set(&line("l1"), "qty", 2i64)?;
            tx.set(&line("l1"), "price", 15i64)?;
            tx.set(&order("o1"), "customer", customer("ada"))?;
            Ok(())
        }),
    );
    let mut before = universe.wait_for_idle().await.state;
    universe.throw_if_error()?;
    print_diff("open_shop", &State::new(Arc::clone(&model)), &before);

    let actions = vec![
        Action::new("add_line", |tx| {
            tx.add(&order("o1"), "lines", line("l2"))?;
            tx.set(&line("l2"), "qty", 1i64)?;
            tx.set(&line("l2"), "price", 40i64)?;
            Ok(())
        }),
        Action::new("hand_over", |tx| {
            tx.add(&customer("linus"), "orders_placed", order("o1"))?;
            Ok(())
        }),
        Action::new("drop_line", |tx| {
            tx.remove(&order("o1"), "lines", line("l1"))?;
            Ok(())
        }),
        Action::new("feel_lucky", |tx| {
            let root = tx.root();
            tx.set(&root, "lucky_number", 80i64)?;
            Ok(())
        }),
    ];

    for action in actions {
        let name = action.name.clone();
        let after = universe.put_and_wait_for_idle(action).await?;
        print_diff(&name, &before, &after);
        before = after;
    }

    universe.backward().await?;
    let undone = universe.wait_for_idle().await.state;
    print_diff("undo", &before, &undone);

    universe.stop().await?;
    let status = universe.wait_for_stopped().await;
    universe.throw_if_error()?;

    println!("\n📊 Final state ({:?}):", started.elapsed());
    print!("{}", status.state.as_string());
    println!("📈 {}", status.stats);
    Ok(())
}
