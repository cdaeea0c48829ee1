//! GraphQL surface mirroring the REST API for the admin dashboard.
//!
//! Query/Mutation types cover User, Vendor, Product and Order. The
//! request context carries the optional authenticated principal
//! decoded from the `Authorization` header; mutations require it.

use async_graphql::{ComplexObject, Context, EmptySubscription, Error, Object, Schema, ID};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::{AuthService, AuthUser},
    entities::{OrderModel, OrderStatus, ProductModel, UserModel, VendorModel},
    handlers::AppServices,
    services::orders::{CreateOrderInput, OrderItemInput},
    services::products::{CreateProductInput, UpdateProductInput},
    services::vendors::{RegisterVendorInput, UpdateVendorInput},
    AppState,
};

pub type MarketplaceSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Optional principal attached to each GraphQL request
#[derive(Clone)]
pub struct GraphQLAuth(pub Option<AuthUser>);

pub fn build_schema(services: AppServices, auth: Arc<AuthService>) -> MarketplaceSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(services)
        .data(auth)
        .finish()
}

/// Mount `/graphql` (POST queries, GET GraphiQL).
pub fn graphql_routes() -> Router<AppState> {
    Router::new().route("/graphql", get(graphiql).post(graphql_handler))
}

async fn graphiql() -> impl IntoResponse {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let auth_user = bearer_principal(&state, &headers);
    state
        .graphql_schema
        .execute(req.into_inner().data(GraphQLAuth(auth_user)))
        .await
        .into()
}

fn bearer_principal(state: &AppState, headers: &HeaderMap) -> Option<AuthUser> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    let claims = state.auth_service.validate_token(token.trim()).ok()?;
    state.auth_service.auth_user_from_claims(claims).ok()
}

fn require_auth(ctx: &Context<'_>) -> Result<AuthUser, Error> {
    ctx.data_opt::<GraphQLAuth>()
        .and_then(|a| a.0.clone())
        .ok_or_else(|| Error::new("Not authenticated"))
}

fn services<'a>(ctx: &'a Context<'a>) -> &'a AppServices {
    ctx.data_unchecked::<AppServices>()
}

fn parse_id(id: &ID) -> Result<Uuid, Error> {
    Uuid::parse_str(id.as_str()).map_err(|_| Error::new("Invalid id"))
}

// ---- Object types ----

#[derive(async_graphql::SimpleObject)]
#[graphql(name = "User")]
pub struct UserObject {
    pub id: ID,
    pub email: String,
    pub role: String,
}

impl From<UserModel> for UserObject {
    fn from(user: UserModel) -> Self {
        Self {
            id: ID(user.id.to_string()),
            email: user.email,
            role: user.role.as_str().to_string(),
        }
    }
}

#[derive(async_graphql::SimpleObject)]
#[graphql(complex, name = "Vendor")]
pub struct VendorObject {
    pub id: ID,
    pub name: String,
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub opening_times: Option<String>,
    pub contact_info: Option<String>,
    pub status: String,
}

impl From<VendorModel> for VendorObject {
    fn from(vendor: VendorModel) -> Self {
        Self {
            id: ID(vendor.id.to_string()),
            name: vendor.name,
            email: vendor.email,
            latitude: vendor.latitude,
            longitude: vendor.longitude,
            location: vendor.location,
            opening_times: vendor.opening_times,
            contact_info: vendor.contact_info,
            status: format!("{:?}", vendor.status).to_lowercase(),
        }
    }
}

#[ComplexObject]
impl VendorObject {
    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<ProductObject>, Error> {
        let vendor_id = parse_id(&self.id)?;
        let (products, _) = services(ctx)
            .products
            .list_by_vendor(vendor_id, 1, 100)
            .await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    async fn orders(&self, ctx: &Context<'_>) -> Result<Vec<OrderObject>, Error> {
        let vendor_id = parse_id(&self.id)?;
        let (orders, _) = services(ctx).orders.list_for_vendor(vendor_id, 1, 100).await?;
        Ok(orders.into_iter().map(Into::into).collect())
    }
}

#[derive(async_graphql::SimpleObject)]
#[graphql(complex, name = "Product")]
pub struct ProductObject {
    pub id: ID,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub vendor_id: ID,
    pub status: String,
    pub shopify_id: Option<String>,
}

impl From<ProductModel> for ProductObject {
    fn from(product: ProductModel) -> Self {
        Self {
            id: ID(product.id.to_string()),
            title: product.title,
            description: product.description,
            price: product.price,
            stock: product.stock,
            vendor_id: ID(product.vendor_id.to_string()),
            status: format!("{:?}", product.status).to_lowercase(),
            shopify_id: product.shopify_id,
        }
    }
}

#[ComplexObject]
impl ProductObject {
    async fn vendor(&self, ctx: &Context<'_>) -> Result<VendorObject, Error> {
        let vendor_id = parse_id(&self.vendor_id)?;
        Ok(services(ctx).vendors.get_vendor(vendor_id).await?.into())
    }
}

#[derive(async_graphql::SimpleObject)]
#[graphql(complex, name = "Order")]
pub struct OrderObject {
    pub id: ID,
    pub order_number: String,
    pub customer_id: Option<ID>,
    pub vendor_id: ID,
    pub date: String,
    pub total: Decimal,
    pub status: String,
}

impl From<OrderModel> for OrderObject {
    fn from(order: OrderModel) -> Self {
        Self {
            id: ID(order.id.to_string()),
            order_number: order.order_number,
            customer_id: order.customer_id.map(|id| ID(id.to_string())),
            vendor_id: ID(order.vendor_id.to_string()),
            date: order.placed_at.to_rfc3339(),
            total: order.total,
            status: format!("{:?}", order.status).to_lowercase(),
        }
    }
}

#[ComplexObject]
impl OrderObject {
    async fn vendor(&self, ctx: &Context<'_>) -> Result<VendorObject, Error> {
        let vendor_id = parse_id(&self.vendor_id)?;
        Ok(services(ctx).vendors.get_vendor(vendor_id).await?.into())
    }
}

// ---- Query root ----

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn vendors(&self, ctx: &Context<'_>) -> Result<Vec<VendorObject>, Error> {
        let (vendors, _) = services(ctx).vendors.list_vendors(1, 100, true).await?;
        Ok(vendors.into_iter().map(Into::into).collect())
    }

    async fn vendor(&self, ctx: &Context<'_>, id: ID) -> Result<Option<VendorObject>, Error> {
        let vendor_id = parse_id(&id)?;
        match services(ctx).vendors.get_vendor(vendor_id).await {
            Ok(vendor) => Ok(Some(vendor.into())),
            Err(crate::errors::ServiceError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn products(
        &self,
        ctx: &Context<'_>,
        vendor_id: ID,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Vec<ProductObject>, Error> {
        let vendor_id = parse_id(&vendor_id)?;
        let limit = limit.unwrap_or(10).clamp(1, 100);
        let page = offset.unwrap_or(0) / limit + 1;

        let (products, _) = services(ctx)
            .products
            .list_by_vendor(vendor_id, page, limit)
            .await?;
        Ok(products.into_iter().map(Into::into).collect())
    }

    async fn product(&self, ctx: &Context<'_>, id: ID) -> Result<Option<ProductObject>, Error> {
        let product_id = parse_id(&id)?;
        match services(ctx).products.get_product(product_id).await {
            Ok(product) => Ok(Some(product.into())),
            Err(crate::errors::ServiceError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn orders(&self, ctx: &Context<'_>, vendor_id: ID) -> Result<Vec<OrderObject>, Error> {
        let vendor_id = parse_id(&vendor_id)?;
        let (orders, _) = services(ctx).orders.list_for_vendor(vendor_id, 1, 100).await?;
        Ok(orders.into_iter().map(Into::into).collect())
    }

    async fn order(&self, ctx: &Context<'_>, id: ID) -> Result<Option<OrderObject>, Error> {
        let order_id = parse_id(&id)?;
        match services(ctx).orders.get_order(order_id).await {
            Ok(order) => Ok(Some(order.order.into())),
            Err(crate::errors::ServiceError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ---- Mutation root ----

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn register(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> Result<UserObject, Error> {
        let auth = ctx.data_unchecked::<Arc<AuthService>>();
        let created = auth.register_user(&email, &password).await?;
        Ok(created.into())
    }

    /// Returns a JWT for the credentials.
    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> Result<String, Error> {
        let auth = ctx.data_unchecked::<Arc<AuthService>>();
        let found = auth.verify_credentials(&email, &password).await?;
        let tokens = auth.generate_token(&found)?;
        Ok(tokens.access_token)
    }

    async fn create_vendor(
        &self,
        ctx: &Context<'_>,
        name: String,
        email: String,
        postcode: String,
        location: Option<String>,
        opening_times: Option<String>,
        contact_info: Option<String>,
    ) -> Result<VendorObject, Error> {
        let auth_user = require_auth(ctx)?;

        let vendor = services(ctx)
            .vendors
            .register_vendor(RegisterVendorInput {
                user_id: auth_user.user_id,
                name,
                email,
                postcode,
                location,
                opening_times,
                contact_info,
            })
            .await?;
        Ok(vendor.into())
    }

    async fn update_vendor(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: Option<String>,
        email: Option<String>,
        postcode: Option<String>,
        location: Option<String>,
        opening_times: Option<String>,
        contact_info: Option<String>,
    ) -> Result<VendorObject, Error> {
        let auth_user = require_auth(ctx)?;
        let vendor_id = parse_id(&id)?;
        self.ensure_vendor_access(ctx, &auth_user, vendor_id).await?;

        let vendor = services(ctx)
            .vendors
            .update_vendor(
                vendor_id,
                UpdateVendorInput {
                    name,
                    email,
                    postcode,
                    location,
                    opening_times,
                    contact_info,
                },
            )
            .await?;
        Ok(vendor.into())
    }

    async fn delete_vendor(&self, ctx: &Context<'_>, id: ID) -> Result<bool, Error> {
        let auth_user = require_auth(ctx)?;
        let vendor_id = parse_id(&id)?;
        self.ensure_vendor_access(ctx, &auth_user, vendor_id).await?;

        services(ctx).vendors.delete_vendor(vendor_id).await?;
        Ok(true)
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        title: String,
        description: String,
        price: Decimal,
        stock: i32,
        vendor_id: ID,
    ) -> Result<ProductObject, Error> {
        let auth_user = require_auth(ctx)?;
        let vendor_id = parse_id(&vendor_id)?;
        self.ensure_vendor_access(ctx, &auth_user, vendor_id).await?;

        let product = services(ctx)
            .products
            .create_product(CreateProductInput {
                vendor_id,
                title,
                description,
                price,
                stock,
                product_type: None,
                tags: None,
                status: None,
            })
            .await?;
        Ok(product.into())
    }

    async fn update_product(
        &self,
        ctx: &Context<'_>,
        id: ID,
        title: Option<String>,
        description: Option<String>,
        price: Option<Decimal>,
        stock: Option<i32>,
    ) -> Result<ProductObject, Error> {
        let auth_user = require_auth(ctx)?;
        let product_id = parse_id(&id)?;
        self.ensure_product_access(ctx, &auth_user, product_id).await?;

        let product = services(ctx)
            .products
            .update_product(
                product_id,
                UpdateProductInput {
                    title,
                    description,
                    price,
                    stock,
                    product_type: None,
                    tags: None,
                    status: None,
                },
            )
            .await?;
        Ok(product.into())
    }

    async fn delete_product(&self, ctx: &Context<'_>, id: ID) -> Result<bool, Error> {
        let auth_user = require_auth(ctx)?;
        let product_id = parse_id(&id)?;
        self.ensure_product_access(ctx, &auth_user, product_id).await?;

        services(ctx).products.delete_product(product_id).await?;
        Ok(true)
    }

    async fn create_order(
        &self,
        ctx: &Context<'_>,
        vendor_id: ID,
        product_id: ID,
        quantity: i32,
    ) -> Result<OrderObject, Error> {
        let auth_user = require_auth(ctx)?;
        let vendor_id = parse_id(&vendor_id)?;
        let product_id = parse_id(&product_id)?;

        let order = services(ctx)
            .orders
            .create_order(CreateOrderInput {
                customer_id: Some(auth_user.user_id),
                vendor_id,
                currency: None,
                items: vec![OrderItemInput {
                    product_id,
                    quantity,
                }],
            })
            .await?;
        Ok(order.order.into())
    }

    async fn update_order_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: String,
    ) -> Result<OrderObject, Error> {
        let auth_user = require_auth(ctx)?;
        let order_id = parse_id(&id)?;

        let order = services(ctx).orders.get_order(order_id).await?;
        self.ensure_vendor_access(ctx, &auth_user, order.order.vendor_id)
            .await?;

        let new_status =
            OrderStatus::from_str(&status).map_err(|_| Error::new("Unknown order status"))?;
        let updated = services(ctx).orders.update_status(order_id, new_status).await?;
        Ok(updated.into())
    }
}

impl MutationRoot {
    /// Caller must be an admin or own the vendor record.
    async fn ensure_vendor_access(
        &self,
        ctx: &Context<'_>,
        auth_user: &AuthUser,
        vendor_id: Uuid,
    ) -> Result<(), Error> {
        if auth_user.is_admin() {
            return Ok(());
        }

        let own = services(ctx)
            .vendors
            .get_vendor_for_user(auth_user.user_id)
            .await?;
        if own.map(|v| v.id) == Some(vendor_id) {
            Ok(())
        } else {
            Err(Error::new("Not authorized"))
        }
    }

    async fn ensure_product_access(
        &self,
        ctx: &Context<'_>,
        auth_user: &AuthUser,
        product_id: Uuid,
    ) -> Result<(), Error> {
        let product = services(ctx).products.get_product(product_id).await?;
        self.ensure_vendor_access(ctx, auth_user, product.vendor_id)
            .await
    }
}

