// Membership contracts endpoint

use serde_json::json;
use tracing::{debug, warn};

use crate::endpoint::{CONTRACTS_HASH, Endpoint};
use crate::error::Error;
use crate::portal::client::{PortalCall, PortalClient};
use crate::portal::models::{Contract, ContractListResponse, Contracts};

impl PortalClient {
    /// `POST Profile/Contracts/ContractList` for the member.
    ///
    /// The user id is resolved like [`get_profile`](Self::get_profile). With
    /// no id available an empty list is returned rather than an error.
    pub async fn get_contracts(&self, user_id: Option<i64>) -> Result<Contracts, Error> {
        let Some(user_id) = self.resolve_user_id(user_id).await? else {
            warn!("no member id available, skipping contracts");
            return Ok(Contracts::default());
        };

        let url = self.portal_url(Endpoint::Contracts.path())?;
        let call =
            PortalCall::post_json(url, json!({ "userId": user_id })).with_hash(CONTRACTS_HASH);
        let resp: ContractListResponse = self.fetch(&call).await?;

        let contracts = Contracts::new(
            resp.contracts
                .unwrap_or_default()
                .into_iter()
                .map(Contract::from)
                .collect(),
        );
        debug!(
            count = contracts.contracts.len(),
            active = ?contracts.active.as_ref().and_then(|c| c.name.as_deref()),
            "fetched contracts"
        );
        Ok(contracts)
    }
}
