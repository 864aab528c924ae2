//! Expenses API endpoints

use api_types::{
    attachment::{AttachmentUpload as ApiUpload, AttachmentView},
    category::CategoryView,
    expense::{
        ExpenseNew, ExpensePage, ExpenseQuery, ExpenseUpdate, ExpenseView, PageLink, SortField,
        SortOrder,
    },
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{JsonBody, PathParam, QueryParams},
    server::ServerState,
    user::User,
};
use engine::{
    AttachmentChange, AttachmentUpload, CreateExpenseCmd, Currency, Expense, ExpenseFilter,
    ExpenseSort, PageMarker, SortDirection, UpdateExpenseCmd, format_currency, page_markers,
};

fn map_sort(field: Option<SortField>, order: Option<SortOrder>) -> ExpenseSort {
    let field = match field.unwrap_or_default() {
        SortField::Date => engine::SortField::Date,
        SortField::Category => engine::SortField::Category,
        SortField::Amount => engine::SortField::Amount,
        SortField::Description => engine::SortField::Description,
    };
    let direction = match order.unwrap_or_default() {
        SortOrder::Asc => SortDirection::Asc,
        SortOrder::Desc => SortDirection::Desc,
    };
    ExpenseSort { field, direction }
}

fn map_marker(marker: PageMarker) -> PageLink {
    match marker {
        PageMarker::Page(page) => PageLink::Page(page),
        PageMarker::Ellipsis => PageLink::Ellipsis,
    }
}

/// Builds the engine filter from the query string shared with `/stats`.
pub(crate) fn filter_from_query(query: &ExpenseQuery) -> Result<ExpenseFilter, ServerError> {
    let currency = query
        .currency
        .as_deref()
        .filter(|code| !code.trim().is_empty())
        .map(Currency::try_from)
        .transpose()?;

    Ok(ExpenseFilter {
        category_id: query.category_id,
        currency,
        start_date: query.start_date,
        end_date: query.end_date,
        search: query.search.clone(),
    })
}

fn decode_upload(upload: ApiUpload) -> Result<AttachmentUpload, ServerError> {
    let data = STANDARD
        .decode(upload.data_base64.as_bytes())
        .map_err(|err| ServerError::Generic(format!("invalid attachment encoding: {err}")))?;
    Ok(AttachmentUpload {
        name: upload.name,
        content_type: upload.content_type,
        data,
    })
}

fn expense_view(expense: Expense) -> ExpenseView {
    let formatted_amount = format_currency(expense.amount, expense.currency.code());
    let category_label = expense.category_label().to_string();
    ExpenseView {
        id: expense.id,
        amount: expense.amount,
        currency: expense.currency.into(),
        formatted_amount,
        category: expense.category.map(|category| CategoryView {
            id: category.id,
            name: category.name,
            icon: category.icon,
            color: category.color,
        }),
        category_label,
        date: expense.date,
        description: expense.description,
        attachment: expense.attachment.map(|attachment| AttachmentView {
            url: attachment.url,
            name: attachment.name,
            content_type: attachment.content_type,
        }),
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    QueryParams(query): QueryParams<ExpenseQuery>,
) -> Result<Json<ExpensePage>, ServerError> {
    let filter = filter_from_query(&query)?;
    let sort = map_sort(query.sort, query.order);
    let page_size = query.page_size.unwrap_or(state.options.page_size);

    let page = state
        .engine
        .expense_page(
            &user.username,
            &filter,
            sort,
            page_size,
            query.page.unwrap_or(1),
        )
        .await?;

    let links = page_markers(page.page, page.total_pages, state.options.page_siblings)
        .into_iter()
        .map(map_marker)
        .collect();

    Ok(Json(ExpensePage {
        expenses: page.items.into_iter().map(expense_view).collect(),
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        total_items: page.total_items,
        start_index: page.start_index,
        end_index: page.end_index,
        links,
    }))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(&user.username, id).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    JsonBody(payload): JsonBody<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let currency = Currency::try_from(payload.currency.as_str())?;
    let mut cmd = CreateExpenseCmd::new(user.username, payload.amount, currency, payload.date);
    if let Some(category_id) = payload.category_id {
        cmd = cmd.category_id(category_id);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(upload) = payload.attachment {
        cmd = cmd.attachment(decode_upload(upload)?);
    }

    let expense = state.engine.create_expense(cmd, state.blobs.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let attachment = match (payload.attachment, payload.remove_attachment) {
        (Some(_), true) => {
            return Err(ServerError::Generic(
                "provide only one of attachment or remove_attachment".to_string(),
            ));
        }
        (Some(upload), false) => AttachmentChange::Replace(decode_upload(upload)?),
        (None, true) => AttachmentChange::Remove,
        (None, false) => AttachmentChange::Keep,
    };

    let mut cmd = UpdateExpenseCmd::new(user.username, id).attachment(attachment);
    if let Some(amount) = payload.amount {
        cmd = cmd.amount(amount);
    }
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(Currency::try_from(currency)?);
    }
    if let Some(date) = payload.date {
        cmd = cmd.date(date);
    }
    if payload.clear_category {
        cmd = cmd.clear_category();
    } else if let Some(category_id) = payload.category_id {
        cmd = cmd.category_id(category_id);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let expense = state.engine.update_expense(cmd, state.blobs.as_ref()).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(&user.username, id, state.blobs.as_ref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
