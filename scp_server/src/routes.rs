//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) must be expressed as futures or asynchronous functions. Async handlers get executed
//! concurrently by worker threads and thus don't block execution.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use scp_engine::{
    chat_objects::MessageDestination,
    db_types::{Conversation, NewComplaint, OrderId, ProductPatch, Role},
    order_objects::CreateOrderRequest,
    traits::{ChatGatewayDatabase, ChatGatewayError, OrderGatewayDatabase, OrderGatewayError},
    ChatApi,
    ComplaintApi,
    OrderFlowApi,
};

use crate::{
    auth::AuthClaims,
    data_objects::{
        CreateComplaintParams,
        JsonResponse,
        Pagination,
        ResolveComplaintParams,
        SendMessageParams,
        SendMessageToPairParams,
    },
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderGatewayDatabase);
/// Places a new order on behalf of the authenticated consumer. Pricing and stock validation happen against the live
/// catalog; the response carries the fully priced order, still `pending`.
pub async fn create_order<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ServerError> {
    let consumer_id = claims.require_consumer()?;
    debug!("💻️ POST order for consumer {consumer_id}");
    let order = api.create_order(consumer_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderGatewayDatabase);
pub async fn my_orders<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for {} ({})", claims.user_id, claims.role);
    let orders = match claims.role {
        Role::Consumer => api.orders_for_consumer(&claims.user_id).await?,
        _ => api.orders_for_supplier(claims.require_staff()?).await?,
    };
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderGatewayDatabase);
pub async fn order_by_id<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {order_id}");
    let order = api.fetch_order(&order_id).await?.ok_or(OrderGatewayError::OrderNotFound(order_id))?;
    let is_party = match claims.role {
        Role::Consumer => order.consumer_id == claims.user_id,
        _ => claims.supplier_id.as_deref() == Some(order.supplier_id.as_str()),
    };
    if !is_party {
        return Err(AuthError::InsufficientPermissions("You are not a party to this order.".to_string()).into());
    }
    Ok(HttpResponse::Ok().json(order))
}

route!(accept_order => Post "/orders/{id}/accept" impl OrderGatewayDatabase);
pub async fn accept_order<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = claims.require_staff()?;
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST accept order {order_id} by supplier {supplier_id}");
    let order = api.accept_order(&order_id, supplier_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(reject_order => Post "/orders/{id}/reject" impl OrderGatewayDatabase);
pub async fn reject_order<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = claims.require_staff()?;
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST reject order {order_id} by supplier {supplier_id}");
    let order = api.reject_order(&order_id, supplier_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl OrderGatewayDatabase);
pub async fn cancel_order<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let consumer_id = claims.require_consumer()?;
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST cancel order {order_id} by consumer {consumer_id}");
    let order = api.cancel_order(&order_id, consumer_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(update_product => Patch "/products/{id}" impl OrderGatewayDatabase);
/// Applies a field-by-field patch to one of the acting supplier's products. Only populated fields change.
pub async fn update_product<B: OrderGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    body: web::Json<ProductPatch>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = claims.require_staff()?;
    let product_id = path.into_inner();
    debug!("💻️ PATCH product {product_id} by supplier {supplier_id}");
    let product = api
        .db()
        .fetch_product(&product_id)
        .await?
        .ok_or_else(|| OrderGatewayError::ProductNotFound(product_id.clone()))?;
    if product.supplier_id != supplier_id {
        return Err(AuthError::InsufficientPermissions("This product belongs to another supplier.".to_string()).into());
    }
    let product = api
        .db()
        .update_product(&product_id, body.into_inner())
        .await?
        .ok_or(OrderGatewayError::ProductNotFound(product_id))?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Chat  ----------------------------------------------------
route!(my_conversations => Get "/conversations" impl ChatGatewayDatabase);
pub async fn my_conversations<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET conversations for {} ({})", claims.user_id, claims.role);
    let conversations = match claims.role {
        Role::Consumer => api.conversations_for_consumer(&claims.user_id).await?,
        _ => api.conversations_for_supplier(claims.require_staff()?).await?,
    };
    Ok(HttpResponse::Ok().json(conversations))
}

route!(conversation_messages => Get "/conversations/{id}/messages" impl ChatGatewayDatabase);
pub async fn conversation_messages<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    pagination: web::Query<Pagination>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversation = conversation_for_party(api.as_ref(), &claims, &path.into_inner()).await?;
    let messages = api.messages(&conversation.id, pagination.limit(), pagination.offset()).await?;
    Ok(HttpResponse::Ok().json(messages))
}

route!(send_message => Post "/conversations/{id}/messages" impl ChatGatewayDatabase);
/// Sends a message into an existing conversation. The response carries the sender's actual organisational role even
/// though storage only keeps the collapsed vocabulary.
pub async fn send_message<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<ChatApi<B>>,
    body: web::Json<SendMessageParams>,
) -> Result<HttpResponse, ServerError> {
    let conversation = conversation_for_party(api.as_ref(), &claims, &path.into_inner()).await?;
    let params = body.into_inner();
    let response = api
        .send_message(
            &claims.user_id,
            claims.role,
            MessageDestination::Conversation(conversation.id),
            params.content,
            params.attachment_url,
        )
        .await?;
    Ok(HttpResponse::Created().json(response))
}

route!(send_message_to_pair => Post "/messages" impl ChatGatewayDatabase);
/// Sends a message addressed by counterparty. The conversation for the pair is created on first contact.
pub async fn send_message_to_pair<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    api: web::Data<ChatApi<B>>,
    body: web::Json<SendMessageToPairParams>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let destination = match claims.role {
        Role::Consumer => {
            let supplier_id = params
                .supplier_id
                .ok_or_else(|| ServerError::InvalidRequestBody("supplier_id is required".to_string()))?;
            MessageDestination::Pair { consumer_id: claims.user_id.clone(), supplier_id }
        },
        _ => {
            let supplier_id = claims.require_staff()?.to_string();
            let consumer_id = params
                .consumer_id
                .ok_or_else(|| ServerError::InvalidRequestBody("consumer_id is required".to_string()))?;
            MessageDestination::Pair { consumer_id, supplier_id }
        },
    };
    let response =
        api.send_message(&claims.user_id, claims.role, destination, params.content, params.attachment_url).await?;
    Ok(HttpResponse::Created().json(response))
}

route!(mark_read => Post "/conversations/{id}/read" impl ChatGatewayDatabase);
pub async fn mark_read<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversation = conversation_for_party(api.as_ref(), &claims, &path.into_inner()).await?;
    let marked = api.mark_read(&conversation.id, &claims.user_id, claims.role).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{marked} messages marked as read"))))
}

async fn conversation_for_party<B: ChatGatewayDatabase>(
    api: &ChatApi<B>,
    claims: &AuthClaims,
    conversation_id: &str,
) -> Result<Conversation, ServerError> {
    let conversation = api
        .db()
        .fetch_conversation(conversation_id)
        .await?
        .ok_or_else(|| ChatGatewayError::ConversationNotFound(conversation_id.to_string()))?;
    let is_party = match claims.role {
        Role::Consumer => conversation.consumer_id == claims.user_id,
        _ => claims.supplier_id.as_deref() == Some(conversation.supplier_id.as_str()),
    };
    if !is_party {
        return Err(
            AuthError::InsufficientPermissions("You are not a party to this conversation.".to_string()).into()
        );
    }
    Ok(conversation)
}

//----------------------------------------------   Complaints  ----------------------------------------------------
route!(create_complaint => Post "/complaints" impl ChatGatewayDatabase);
pub async fn create_complaint<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    api: web::Data<ComplaintApi<B>>,
    body: web::Json<CreateComplaintParams>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = claims.require_staff()?;
    let params = body.into_inner();
    debug!("💻️ POST complaint for supplier {supplier_id}");
    let complaint = NewComplaint {
        conversation_id: params.conversation_id,
        consumer_id: params.consumer_id,
        supplier_id: supplier_id.to_string(),
        order_id: params.order_id,
        title: params.title,
        description: params.description,
        priority: params.priority,
    };
    let complaint = api.create_complaint(complaint).await?;
    Ok(HttpResponse::Created().json(complaint))
}

route!(my_complaints => Get "/complaints" impl ChatGatewayDatabase);
pub async fn my_complaints<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    api: web::Data<ComplaintApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = claims.require_staff()?;
    let complaints = api.complaints_for_supplier(supplier_id).await?;
    Ok(HttpResponse::Ok().json(complaints))
}

route!(complaint_by_id => Get "/complaints/{id}" impl ChatGatewayDatabase);
pub async fn complaint_by_id<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<ComplaintApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let supplier_id = claims.require_staff()?;
    let complaint_id = path.into_inner();
    let complaint = api
        .fetch_complaint(&complaint_id)
        .await?
        .ok_or(ChatGatewayError::ComplaintNotFound(complaint_id))?;
    if complaint.supplier_id != supplier_id {
        return Err(
            AuthError::InsufficientPermissions("This complaint belongs to another supplier.".to_string()).into()
        );
    }
    Ok(HttpResponse::Ok().json(complaint))
}

route!(escalate_complaint => Post "/complaints/{id}/escalate" impl ChatGatewayDatabase);
/// Escalates a complaint to management. The status change and the system message in the linked conversation commit
/// together.
pub async fn escalate_complaint<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<ComplaintApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_staff()?;
    let complaint_id = path.into_inner();
    debug!("💻️ POST escalate complaint {complaint_id} by {}", claims.user_id);
    let complaint = api.escalate_complaint(&complaint_id, &claims.user_id).await?;
    Ok(HttpResponse::Ok().json(complaint))
}

route!(resolve_complaint => Post "/complaints/{id}/resolve" impl ChatGatewayDatabase);
pub async fn resolve_complaint<B: ChatGatewayDatabase>(
    claims: AuthClaims,
    path: web::Path<String>,
    api: web::Data<ComplaintApi<B>>,
    body: web::Json<ResolveComplaintParams>,
) -> Result<HttpResponse, ServerError> {
    claims.require_staff()?;
    let complaint_id = path.into_inner();
    let complaint = api.resolve_complaint(&complaint_id, &body.resolution).await?;
    Ok(HttpResponse::Ok().json(complaint))
}
