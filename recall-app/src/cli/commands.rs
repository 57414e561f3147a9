use crate::cli::opts::*;

use anyhow::{anyhow, Result};
use chrono::Utc;
use recall_core::{Card, CardStore, Pack, Quality};
use recall_local::{FileKv, KeyValue, LocalStore};
use recall_remote::{HttpApi, RemoteStore};
use std::sync::Arc;
use uuid::Uuid;

pub async fn run_cli(args: Cli) -> Result<()> {
    let store = open_store(&args).await?;
    match args.cmd.clone() {
        Command::Card(cmd) => card_cmd(store, cmd).await,
        Command::Pack(cmd) => pack_cmd(store, cmd).await,
        Command::Review { card_id, quality } => {
            let id = parse_uuid(&card_id)?;
            let quality = Quality::new(quality)?;
            let card = store.record_review(id, quality).await?;
            println!(
                "ease={:.2}\tinterval={}d\treps={}\tnext={}",
                card.ease_factor,
                card.interval_days,
                card.repetitions,
                fmt_next(&card)
            );
            Ok(())
        }
        Command::Undo { card_id } => {
            let id = parse_uuid(&card_id)?;
            if store.undo_last_review(id).await? {
                println!("reverted");
            } else {
                println!("nothing to revert");
            }
            Ok(())
        }
        Command::StudyTime { minutes } => {
            store.add_study_time(minutes).await?;
            println!("ok");
            Ok(())
        }
        Command::Stats => {
            let s = store.stats().await?;
            println!("cards\t{}", s.total_cards);
            println!("due\t{}", s.due_now);
            println!("reviewed today\t{}", s.reviewed_today);
            println!("mastered\t{}", s.mastered);
            println!("streak\t{} (longest {})", s.current_streak, s.longest_streak);
            if let Some(d) = s.last_study_date {
                println!("last studied\t{d}");
            }
            Ok(())
        }
        Command::Reset => {
            store.reset_all().await?;
            println!("ok");
            Ok(())
        }
    }
}

pub async fn open_store(args: &Cli) -> Result<Arc<dyn CardStore>> {
    let kv: Arc<dyn KeyValue> = match &args.store_path {
        Some(p) => Arc::new(FileKv::open(p.clone())?),
        None => Arc::new(FileKv::open(recall_local::paths::default_store_file())?),
    };
    match args.backend {
        Backend::Local => Ok(Arc::new(LocalStore::open(kv))),
        Backend::Remote => {
            let session = args
                .session
                .clone()
                .ok_or_else(|| anyhow!("--session is required with --backend remote"))?;
            let api = Arc::new(HttpApi::new(args.api_url.clone())?);
            let store = RemoteStore::connect(api, session, kv).await?;
            Ok(Arc::new(store))
        }
    }
}

async fn card_cmd(store: Arc<dyn CardStore>, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add {
            source,
            source_id,
            packs,
        } => {
            let mut extra = Vec::new();
            for sel in &packs {
                extra.push(resolve_pack(&*store, sel).await?.id);
            }
            match store.add_card(source.into(), &source_id, &extra).await? {
                Some(card) => println!("{}", card.id),
                None => println!("already saved"),
            }
        }
        CardCmd::List => {
            for c in store.list_cards().await? {
                print_card(&c);
            }
        }
        CardCmd::Due { pack } => {
            let pack_id = match pack {
                Some(sel) => Some(resolve_pack(&*store, &sel).await?.id),
                None => None,
            };
            for c in store.due_cards(pack_id).await? {
                print_card(&c);
            }
        }
        CardCmd::Rm { card_id } => {
            store.remove_card(parse_uuid(&card_id)?).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn pack_cmd(store: Arc<dyn CardStore>, cmd: PackCmd) -> Result<()> {
    match cmd {
        PackCmd::Add {
            name,
            description,
            color,
        } => {
            let pack = store
                .create_pack(&name, description.as_deref(), &color)
                .await?;
            println!("{}", pack.id);
        }
        PackCmd::List => {
            for s in store.pack_summaries().await? {
                println!("{}\t{}\tcards={}\tdue={}", s.pack_id, s.name, s.card_count, s.due_count);
            }
        }
        PackCmd::Rename { pack, name } => {
            let p = resolve_pack(&*store, &pack).await?;
            store.rename_pack(p.id, &name).await?;
            println!("ok");
        }
        PackCmd::Rm { pack } => {
            let p = resolve_pack(&*store, &pack).await?;
            store.delete_pack(p.id).await?;
            println!("ok");
        }
        PackCmd::AddCard { card_id, pack } => {
            let p = resolve_pack(&*store, &pack).await?;
            store.add_card_to_pack(parse_uuid(&card_id)?, p.id).await?;
            println!("ok");
        }
        PackCmd::RmCard { card_id, pack } => {
            let p = resolve_pack(&*store, &pack).await?;
            store
                .remove_card_from_pack(parse_uuid(&card_id)?, p.id)
                .await?;
            println!("ok");
        }
    }
    Ok(())
}

/// Accepts a pack id or a (case-insensitive) pack name.
async fn resolve_pack(store: &dyn CardStore, sel: &str) -> Result<Pack> {
    let packs = store.list_packs().await?;
    if let Ok(id) = Uuid::parse_str(sel) {
        if let Some(p) = packs.iter().find(|p| p.id == id) {
            return Ok(p.clone());
        }
    }
    packs
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(sel))
        .cloned()
        .ok_or_else(|| anyhow!("no pack matching '{sel}'"))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| anyhow!("invalid id: {s}"))
}

fn fmt_next(card: &Card) -> String {
    match card.next_review_at {
        Some(at) if at <= Utc::now() => "now".to_string(),
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "now".to_string(),
    }
}

fn print_card(c: &Card) {
    let kind = match c.source_type {
        recall_core::SourceType::Milestone => "milestone",
        recall_core::SourceType::Concept => "concept",
    };
    println!(
        "{}\t{}\t{}\treps={}\tinterval={}d\tnext={}",
        c.id,
        kind,
        c.source_id,
        c.repetitions,
        c.interval_days,
        fmt_next(c)
    );
}
