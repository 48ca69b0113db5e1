//! Simulated meetup coordination
//!
//! Run with: cargo run --example meetup_server
//!
//! Three users share an event that starts in ten minutes. Two of them are
//! connected, one from two devices. The demo casts votes, sends a buzz and
//! removes a member, printing every message as the clients would receive it
//! along with the recipients that would get mail instead.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use eventvote::registry::ConnectionReceiver;
use eventvote::{
    ChangeType, EngineConfig, EventCoordinator, EventRecord, EventSchedule, LocationVoteInfo,
    RegistryConfig, UserRef,
};

/// Print everything a client connection receives until it closes
fn spawn_client(label: String, mut receiver: ConnectionReceiver) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(raw) = receiver.recv().await {
            println!("[{}] {}", label, String::from_utf8_lossy(&raw));
        }
        println!("[{}] closed", label);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eventvote=debug".parse()?)
                .add_directive("meetup_server=info".parse()?),
        )
        .init();

    let config = EngineConfig::default().registry(
        RegistryConfig::default()
            .cleanup_interval(Duration::from_secs(5))
            .max_connections_per_user(4),
    );
    let coordinator = EventCoordinator::with_config(config);
    let cleanup = coordinator.registry().spawn_cleanup_task();

    let owner = UserRef::new(1, "olivia");
    let alice = UserRef::new(2, "alice");
    let bob = UserRef::new(3, "bob");

    let now = Utc::now().timestamp();
    let schedule = EventSchedule::one_off(now + 600, 3_600)?;
    let event = EventRecord::new(77, owner.id, schedule)
        .with_member(alice.id)
        .with_member(bob.id)
        .with_location(1, "Ramen Corner")
        .with_location(2, "Taco Truck");

    // Olivia on phone and laptop, Alice on one device, Bob offline
    let mut clients = Vec::new();
    for (user, device) in [(&owner, "phone"), (&owner, "laptop"), (&alice, "phone")] {
        let conn = coordinator.connect(user).await?;
        tracing::info!(
            user = %user.name,
            connection_id = %conn.handle.id(),
            came_online = conn.came_online,
            "Client connected"
        );
        clients.push((
            user.id,
            conn.handle.id(),
            spawn_client(format!("{}/{}", user.name, device), conn.receiver),
        ));
    }

    coordinator.vote_now(&event, 1, &alice, true).await?;
    coordinator.vote_now(&event, 1, &owner, true).await?;
    coordinator.vote_now(&event, 2, &bob, true).await?;
    coordinator.vote_now(&event, 2, &bob, false).await?;

    let offline = coordinator
        .buzz(&event, &alice, json!({ "text": "Ramen it is?" }))
        .await?;
    println!("buzz offline recipients: {:?}", offline);

    let mut event = event;
    event.members.remove(&bob.id);
    let offline = coordinator.member_removed(&event, bob.id).await?;
    println!("member removal offline recipients: {:?}", offline);

    for ledger in coordinator.ledgers().current_votes(&event, now).await {
        println!("{}", serde_json::to_string(&LocationVoteInfo::from(&ledger))?);
    }

    let offline = coordinator
        .location_changed(&event, 2, ChangeType::Remove)
        .await?;
    println!("location removal offline recipients: {:?}", offline);

    for (user_id, connection_id, _) in &clients {
        coordinator.disconnect(*user_id, *connection_id).await;
    }

    let registry = coordinator.registry().stats().await;
    let dispatch = coordinator.dispatcher().stats();
    tracing::info!(
        online_users = registry.online_users,
        broadcasts = dispatch.broadcasts,
        messages_sent = dispatch.messages_sent,
        offline_recipients = dispatch.offline_recipients,
        "Demo finished"
    );

    // Dropping the coordinator releases the last senders and ends the clients
    cleanup.abort();
    drop(coordinator);
    for (_, _, task) in clients {
        task.await?;
    }

    Ok(())
}
