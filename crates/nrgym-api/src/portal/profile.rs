// Member identity and profile endpoints

use serde_json::json;
use tracing::{debug, warn};

use crate::endpoint::{Endpoint, profile_hash};
use crate::error::Error;
use crate::portal::client::{PortalCall, PortalClient};
use crate::portal::models::{
    Identity, IdentityResponse, Profile, ProductsResponse, ProfileResponse,
};

impl PortalClient {
    /// `POST Auth/Login/Identity`: who the session belongs to.
    ///
    /// The member id is cached for later profile and contract calls.
    pub async fn get_identity(&self) -> Result<Identity, Error> {
        let url = self.portal_url(Endpoint::Identity.path())?;
        let call = PortalCall::post_empty(url);
        let resp: IdentityResponse = self.fetch(&call).await?;

        let member = resp.member.ok_or_else(|| Error::UnexpectedShape {
            endpoint: call.endpoint(),
            message: "identity response has no Member".into(),
        })?;
        let identity = Identity::from(member);
        if let Some(id) = identity.user_id {
            self.remember_user_id(id);
        }
        debug!(user_id = ?identity.user_id, home_club = ?identity.home_club_id, "fetched identity");
        Ok(identity)
    }

    /// Pick the user id for profile-scoped calls: `explicit`, else the
    /// cached id, else whatever the identity endpoint reports.
    ///
    /// A failing identity lookup yields `None` unless the failure is an
    /// authentication one.
    pub async fn resolve_user_id(&self, explicit: Option<i64>) -> Result<Option<i64>, Error> {
        if let Some(id) = explicit.or_else(|| self.known_user_id()) {
            return Ok(Some(id));
        }
        match self.get_identity().await {
            Ok(identity) => Ok(identity.user_id),
            Err(e) if e.is_auth() => Err(e),
            Err(e) => {
                warn!(error = %e, "could not look up member id");
                Ok(None)
            }
        }
    }

    /// `POST Profile/Profile/GetProfileForEdit`.
    ///
    /// With a user id the body is `{"userId": id}` and the profile editor
    /// hash is sent; without one the body is empty. The club name comes
    /// from the products endpoint and is left empty if that call fails.
    pub async fn get_profile(&self, user_id: Option<i64>) -> Result<Profile, Error> {
        let user_id = self.resolve_user_id(user_id).await?;
        let url = self.portal_url(Endpoint::ProfileForEdit.path())?;
        let call = match user_id {
            Some(id) => PortalCall::post_json(url, json!({ "userId": id })).with_hash(profile_hash(id)),
            None => PortalCall::post_empty(url),
        };

        let resp: ProfileResponse = self.fetch(&call).await?;
        let model = resp.model.ok_or_else(|| Error::UnexpectedShape {
            endpoint: call.endpoint(),
            message: "profile response has no Model".into(),
        })?;

        let mut profile = Profile::from_model(model, user_id);
        if let Some(id) = profile.user_id {
            self.remember_user_id(id);
        }

        profile.club_name = match self.get_products().await {
            Ok(name) => name,
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => {
                debug!(error = %e, "products lookup failed, leaving club name empty");
                None
            }
        };

        debug!(user_id = ?profile.user_id, "fetched profile");
        Ok(profile)
    }

    /// `GET Products/ChooseProducts/GetProductsForUser`: name of the club
    /// the member's products belong to.
    pub async fn get_products(&self) -> Result<Option<String>, Error> {
        let url = self.portal_url(Endpoint::ProductsForUser.path())?;
        let resp: ProductsResponse = self.fetch(&PortalCall::get(url)).await?;
        Ok(resp.club_name.filter(|name| !name.is_empty()))
    }
}
