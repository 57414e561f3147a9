use crate::api::{NewCard, NewPack, PackUpdate, RemoteApi, ReviewOutcome};
use async_trait::async_trait;
use recall_core::{Card, CardId, Pack, PackId, Quality, StoreError};
use serde::Serialize;

fn remote_err(err: reqwest::Error) -> StoreError {
    StoreError::Remote(err.to_string())
}

/// reqwest-backed client for the session-scoped backend endpoints.
pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().build().map_err(remote_err)?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { base_url, client })
    }

    fn url(&self, session: &str, rest: &str) -> String {
        format!("{}/sessions/{session}/{rest}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        session: &str,
        rest: &str,
    ) -> Result<T, StoreError> {
        self.client
            .get(self.url(session, rest))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(remote_err)?
            .json()
            .await
            .map_err(remote_err)
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        session: &str,
        rest: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        self.client
            .post(self.url(session, rest))
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(remote_err)?
            .json()
            .await
            .map_err(remote_err)
    }

    async fn delete(&self, session: &str, rest: &str) -> Result<(), StoreError> {
        self.client
            .delete(self.url(session, rest))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(remote_err)?;
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn list_cards(&self, session: &str) -> Result<Vec<Card>, StoreError> {
        self.get_json(session, "cards").await
    }

    async fn list_packs(&self, session: &str) -> Result<Vec<Pack>, StoreError> {
        self.get_json(session, "packs").await
    }

    async fn add_card(&self, session: &str, new: &NewCard) -> Result<Card, StoreError> {
        self.post_json(session, "cards", new).await
    }

    async fn remove_card(&self, session: &str, card_id: CardId) -> Result<(), StoreError> {
        self.delete(session, &format!("cards/{card_id}")).await
    }

    async fn submit_review(
        &self,
        session: &str,
        card_id: CardId,
        quality: Quality,
    ) -> Result<ReviewOutcome, StoreError> {
        self.post_json(
            session,
            &format!("cards/{card_id}/review"),
            &serde_json::json!({ "quality": quality.value() }),
        )
        .await
    }

    async fn create_pack(&self, session: &str, new: &NewPack) -> Result<Pack, StoreError> {
        self.post_json(session, "packs", new).await
    }

    async fn update_pack(
        &self,
        session: &str,
        pack_id: PackId,
        update: &PackUpdate,
    ) -> Result<Pack, StoreError> {
        self.client
            .patch(self.url(session, &format!("packs/{pack_id}")))
            .json(update)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(remote_err)?
            .json()
            .await
            .map_err(remote_err)
    }

    async fn delete_pack(&self, session: &str, pack_id: PackId) -> Result<(), StoreError> {
        self.delete(session, &format!("packs/{pack_id}")).await
    }

    async fn set_card_packs(
        &self,
        session: &str,
        card_id: CardId,
        pack_ids: &[PackId],
    ) -> Result<Card, StoreError> {
        self.client
            .put(self.url(session, &format!("cards/{card_id}/packs")))
            .json(&serde_json::json!({ "pack_ids": pack_ids }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(remote_err)?
            .json()
            .await
            .map_err(remote_err)
    }
}
