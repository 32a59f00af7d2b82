//! Users, favourites and orders. Every call here except login/register
//! carries the session's bearer token.

use eyewear_core::{OrderId, Product, ProductId};
use reqwest::Method;
use tracing::instrument;

use crate::api::types::{
    AuthResponse, CheckoutRequest, CheckoutSession, CheckoutVerification, FavouriteEntry,
    FavouriteInput, LoginRequest, Order, Page, PasswordChange, ProfileUpdate, RegisterRequest,
    SessionUser, UserProfile,
};
use crate::api::{ApiClient, ApiError};

impl ApiClient {
    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<SessionUser, ApiError> {
        let AuthResponse(session) = self
            .send_json(Method::POST, "users/login", request, None)
            .await?;
        Ok(session)
    }

    /// Create an account; the backend logs the new user in.
    ///
    /// # Errors
    ///
    /// Returns an error if registration is rejected or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<SessionUser, ApiError> {
        let AuthResponse(session) = self
            .send_json(Method::POST, "users/register", request, None)
            .await?;
        Ok(session)
    }

    /// Update the profile and return the stored version.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the request fails.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate<'_>,
    ) -> Result<UserProfile, ApiError> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Response {
            Wrapped { user: UserProfile },
            Bare(UserProfile),
        }

        let response: Response = self
            .send_json(Method::PUT, "users/profile", update, Some(token))
            .await?;
        Ok(match response {
            Response::Wrapped { user } | Response::Bare(user) => user,
        })
    }

    /// Change the account password.
    ///
    /// # Errors
    ///
    /// Returns an error if the current password is wrong or the request fails.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        token: &str,
        change: &PasswordChange<'_>,
    ) -> Result<(), ApiError> {
        self.send_unit(Method::PUT, "users/change-password", Some(change), Some(token))
            .await
    }

    // =========================================================================
    // Favourites
    // =========================================================================

    /// The user's favourite products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn favourites(&self, token: &str) -> Result<Vec<Product>, ApiError> {
        let page: Page<FavouriteEntry> = self.get_json("favourites", &[], Some(token)).await?;
        Ok(page
            .items
            .into_iter()
            .map(FavouriteEntry::into_product)
            .collect())
    }

    /// Add a product to favourites.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product = %product_id))]
    pub async fn add_favourite(&self, token: &str, product_id: &ProductId) -> Result<(), ApiError> {
        let body = FavouriteInput {
            product_id: product_id.as_str(),
        };
        self.send_unit(Method::POST, "favourites", Some(&body), Some(token))
            .await
    }

    /// Remove a product from favourites.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product = %product_id))]
    pub async fn remove_favourite(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        let path = format!("favourites/{}", urlencoding::encode(product_id.as_str()));
        self.send_unit::<()>(Method::DELETE, &path, None, Some(token))
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// The user's orders, newest first as the backend returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let page: Page<Order> = self.get_json("orders/my-orders", &[], Some(token)).await?;
        Ok(page.items)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self, token), fields(order = %id))]
    pub async fn get_order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Response {
            Wrapped { order: Order },
            Bare(Order),
        }

        let path = format!("orders/{}", urlencoding::encode(id.as_str()));
        let response: Response = self.get_json(&path, &[], Some(token)).await?;
        Ok(match response {
            Response::Wrapped { order } | Response::Bare(order) => order,
        })
    }

    /// Create a hosted payment session for the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the checkout.
    #[instrument(skip_all, fields(items = request.items.len()))]
    pub async fn create_checkout_session(
        &self,
        token: &str,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError> {
        self.send_json(
            Method::POST,
            "orders/create-checkout-session",
            request,
            Some(token),
        )
        .await
    }

    /// Confirm a payment session after the provider redirects back.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or the request fails.
    #[instrument(skip(self, token))]
    pub async fn verify_checkout_session(
        &self,
        token: &str,
        session_id: &str,
    ) -> Result<CheckoutVerification, ApiError> {
        let path = format!("orders/verify-session/{}", urlencoding::encode(session_id));
        self.get_json(&path, &[], Some(token)).await
    }
}
