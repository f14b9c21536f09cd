use eventhub_client::{EventHubClient, EventView};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eventhub_client::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = EventHubClient::from_env();
    println!("Using {}", client.config().base_url);

    if let (Ok(login), Ok(password)) = (
        std::env::var("EVENTHUB_LOGIN"),
        std::env::var("EVENTHUB_PASSWORD"),
    ) {
        let user = client.session().login(&login, &password).await?;
        println!("Signed in as {} ({})", user.full_name, user.role);
    }

    let store = client.store();
    store.fetch_list(false).await?;
    let cards = store.cards().await;
    println!("Found {} events", cards.len());

    for card in &cards {
        println!("[{}] {} - {} ({})", card.id, card.title, card.date, card.state);
    }

    let Some(first) = cards.first() else {
        return Ok(());
    };
    store.fetch_detail(first.id, false).await?;
    if let Some(EventView::Detail(detail)) = store.event(first.id).await {
        println!("\n{}\n{}", detail.card.title, detail.description);
        for activity in &detail.activities {
            println!("  {} {} (max {})", activity.icon, activity.name, activity.max_score);
        }
    }

    store.fetch_participations(first.id, false).await?;
    for participation in store.participations(first.id).await.unwrap_or_default() {
        println!(
            "  {} - {} member(s)",
            participation.display_name(),
            participation.members.len()
        );
    }

    Ok(())
}
