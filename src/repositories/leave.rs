//! # Leave Repository
//!
//! Leave type catalogue, leave requests with a pending →
//! approved/rejected/cancelled lifecycle, multi-level approval rows, and
//! per-year balances.

use crate::error::RepositoryError;
use crate::models::leave_approval::{
    ActiveModel as LeaveApprovalActiveModel, Column as LeaveApprovalColumn, Entity as LeaveApproval,
    Model as LeaveApprovalModel,
};
use crate::models::leave_request::{
    ActiveModel as LeaveRequestActiveModel, Column as LeaveRequestColumn, Entity as LeaveRequest,
    Model as LeaveRequestModel,
};
use crate::models::leave_type::{
    ActiveModel as LeaveTypeActiveModel, Column as LeaveTypeColumn, Entity as LeaveType,
    Model as LeaveTypeModel,
};
use crate::models::user_leave_balance::{
    ActiveModel as BalanceActiveModel, Column as BalanceColumn, Entity as UserLeaveBalance,
    Model as BalanceModel,
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Request data for creating a leave request
#[derive(Debug, Clone)]
pub struct CreateLeaveRequest {
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Repository for leave management operations
pub struct LeaveRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeaveRepository<'a> {
    /// Create a new LeaveRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    // Leave types

    /// Create a tenant-scoped leave type
    pub async fn create_leave_type(
        &self,
        tenant_id: Uuid,
        name: &str,
        description: Option<String>,
        max_days_per_year: i32,
        requires_approval: bool,
    ) -> Result<LeaveTypeModel, RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::validation_error(
                "Leave type name cannot be empty",
            ));
        }
        if max_days_per_year < 0 {
            return Err(RepositoryError::validation_error(
                "Max days per year cannot be negative",
            ));
        }

        let existing = LeaveType::find()
            .filter(LeaveTypeColumn::TenantId.eq(tenant_id))
            .filter(LeaveTypeColumn::Name.eq(name.trim()))
            .filter(LeaveTypeColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "Leave type '{}' already exists in this tenant",
                name.trim()
            )));
        }

        let now = Utc::now();
        let leave_type = LeaveTypeActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(name.trim().to_string()),
            description: Set(description),
            max_days_per_year: Set(max_days_per_year),
            requires_approval: Set(requires_approval),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        leave_type
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List a tenant's leave types
    pub async fn list_leave_types(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<LeaveTypeModel>, RepositoryError> {
        let types = LeaveType::find()
            .filter(LeaveTypeColumn::TenantId.eq(tenant_id))
            .filter(LeaveTypeColumn::IsDeleted.eq(false))
            .order_by_asc(LeaveTypeColumn::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(types)
    }

    // Leave requests

    /// Create a leave request.
    ///
    /// `total_days` is the inclusive day count of the range. When a balance
    /// row exists for the request year, insufficient remaining days is a
    /// conflict.
    pub async fn create_leave_request(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: CreateLeaveRequest,
    ) -> Result<LeaveRequestModel, RepositoryError> {
        if request.end_date < request.start_date {
            return Err(RepositoryError::validation_error(
                "End date cannot be before start date",
            ));
        }

        let leave_type = LeaveType::find_by_id(request.leave_type_id)
            .filter(LeaveTypeColumn::TenantId.eq(tenant_id))
            .filter(LeaveTypeColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("Leave type not found"))?;

        // Inclusive day count: a one-day leave spans one day.
        let total_days = (request.end_date - request.start_date).num_days() as i32 + 1;

        let year = request.start_date.year();
        if let Some(balance) = self
            .get_balance(user_id, leave_type.id, year)
            .await?
        {
            let remaining = balance.allocated_days - balance.used_days;
            if total_days > remaining {
                return Err(RepositoryError::conflict(format!(
                    "Insufficient leave balance: requested {} days, {} remaining",
                    total_days, remaining
                )));
            }
        }

        let now = Utc::now();
        let leave_request = LeaveRequestActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            user_id: Set(user_id),
            leave_type_id: Set(leave_type.id),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            total_days: Set(total_days),
            reason: Set(request.reason),
            status: Set("pending".to_string()),
            approved_by: Set(None),
            rejected_by: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        leave_request
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get a live leave request within a tenant
    pub async fn get_leave_request(
        &self,
        tenant_id: Uuid,
        request_id: Uuid,
    ) -> Result<Option<LeaveRequestModel>, RepositoryError> {
        let request = LeaveRequest::find_by_id(request_id)
            .filter(LeaveRequestColumn::TenantId.eq(tenant_id))
            .filter(LeaveRequestColumn::IsDeleted.eq(false))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(request)
    }

    /// List a user's leave requests, newest first
    pub async fn list_user_requests(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<LeaveRequestModel>, u64), RepositoryError> {
        let paginator = LeaveRequest::find()
            .filter(LeaveRequestColumn::TenantId.eq(tenant_id))
            .filter(LeaveRequestColumn::UserId.eq(user_id))
            .filter(LeaveRequestColumn::IsDeleted.eq(false))
            .order_by_desc(LeaveRequestColumn::CreatedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let requests = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((requests, total))
    }

    /// List a tenant's pending leave requests, oldest first
    pub async fn list_pending_requests(
        &self,
        tenant_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<LeaveRequestModel>, u64), RepositoryError> {
        let paginator = LeaveRequest::find()
            .filter(LeaveRequestColumn::TenantId.eq(tenant_id))
            .filter(LeaveRequestColumn::Status.eq("pending"))
            .filter(LeaveRequestColumn::IsDeleted.eq(false))
            .order_by_asc(LeaveRequestColumn::CreatedAt)
            .paginate(self.db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(RepositoryError::database_error)?;
        let requests = paginator
            .fetch_page(page)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok((requests, total))
    }

    /// Approve a pending request, recording an approval row at the given
    /// level and deducting the year's balance when a row exists.
    pub async fn approve_request(
        &self,
        tenant_id: Uuid,
        request_id: Uuid,
        approver_id: Uuid,
        approval_level: i32,
        comments: Option<String>,
    ) -> Result<LeaveRequestModel, RepositoryError> {
        let request = self.require_pending(tenant_id, request_id).await?;

        self.record_approval(request.id, approver_id, approval_level, true, comments)
            .await?;

        // Deduct from the balance for the year the leave starts in.
        let year = request.start_date.year();
        if let Some(balance) = self
            .get_balance(request.user_id, request.leave_type_id, year)
            .await?
        {
            let used = balance.used_days;
            let mut active = balance.into_active_model();
            active.used_days = Set(used + request.total_days);
            active.updated_at = Set(Utc::now().into());
            active
                .update(self.db)
                .await
                .map_err(RepositoryError::database_error)?;
        }

        let mut active = request.into_active_model();
        active.status = Set("approved".to_string());
        active.approved_by = Set(Some(approver_id));
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Reject a pending request, recording an approval row at the given level
    pub async fn reject_request(
        &self,
        tenant_id: Uuid,
        request_id: Uuid,
        rejecter_id: Uuid,
        approval_level: i32,
        comments: Option<String>,
    ) -> Result<LeaveRequestModel, RepositoryError> {
        let request = self.require_pending(tenant_id, request_id).await?;

        self.record_approval(request.id, rejecter_id, approval_level, false, comments)
            .await?;

        let mut active = request.into_active_model();
        active.status = Set("rejected".to_string());
        active.rejected_by = Set(Some(rejecter_id));
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Cancel a pending request; only the requester may cancel
    pub async fn cancel_request(
        &self,
        tenant_id: Uuid,
        request_id: Uuid,
        user_id: Uuid,
    ) -> Result<LeaveRequestModel, RepositoryError> {
        let request = self.require_pending(tenant_id, request_id).await?;

        if request.user_id != user_id {
            return Err(RepositoryError::validation_error(
                "Only the requester can cancel a leave request",
            ));
        }

        let mut active = request.into_active_model();
        active.status = Set("cancelled".to_string());
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List the approval rows for a request, by level
    pub async fn list_approvals(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<LeaveApprovalModel>, RepositoryError> {
        let approvals = LeaveApproval::find()
            .filter(LeaveApprovalColumn::LeaveRequestId.eq(request_id))
            .order_by_asc(LeaveApprovalColumn::ApprovalLevel)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(approvals)
    }

    // Balances

    /// Get the balance row for a (user, leave type, year), if present
    pub async fn get_balance(
        &self,
        user_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> Result<Option<BalanceModel>, RepositoryError> {
        let balance = UserLeaveBalance::find()
            .filter(BalanceColumn::UserId.eq(user_id))
            .filter(BalanceColumn::LeaveTypeId.eq(leave_type_id))
            .filter(BalanceColumn::Year.eq(year))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(balance)
    }

    /// List all balance rows for a user
    pub async fn list_balances(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BalanceModel>, RepositoryError> {
        let balances = UserLeaveBalance::find()
            .filter(BalanceColumn::UserId.eq(user_id))
            .order_by_asc(BalanceColumn::Year)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(balances)
    }

    /// Create or update the allocation for a (user, leave type, year)
    pub async fn set_balance(
        &self,
        user_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
        allocated_days: i32,
    ) -> Result<BalanceModel, RepositoryError> {
        if allocated_days < 0 {
            return Err(RepositoryError::validation_error(
                "Allocated days cannot be negative",
            ));
        }

        if let Some(balance) = self.get_balance(user_id, leave_type_id, year).await? {
            let mut active = balance.into_active_model();
            active.allocated_days = Set(allocated_days);
            active.updated_at = Set(Utc::now().into());
            return active
                .update(self.db)
                .await
                .map_err(RepositoryError::database_error);
        }

        let balance = BalanceActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            leave_type_id: Set(leave_type_id),
            year: Set(year),
            allocated_days: Set(allocated_days),
            used_days: Set(0),
            updated_at: Set(Utc::now().into()),
        };

        balance
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    async fn require_pending(
        &self,
        tenant_id: Uuid,
        request_id: Uuid,
    ) -> Result<LeaveRequestModel, RepositoryError> {
        let request = self
            .get_leave_request(tenant_id, request_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Leave request not found"))?;

        if request.status != "pending" {
            return Err(RepositoryError::conflict(format!(
                "Leave request is already {}",
                request.status
            )));
        }

        Ok(request)
    }

    async fn record_approval(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        approval_level: i32,
        is_approved: bool,
        comments: Option<String>,
    ) -> Result<(), RepositoryError> {
        let existing = LeaveApproval::find()
            .filter(LeaveApprovalColumn::LeaveRequestId.eq(request_id))
            .filter(LeaveApprovalColumn::ApprovalLevel.eq(approval_level))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if existing.is_some() {
            return Err(RepositoryError::conflict(format!(
                "A decision at approval level {} already exists",
                approval_level
            )));
        }

        let approval = LeaveApprovalActiveModel {
            id: Set(Uuid::new_v4()),
            leave_request_id: Set(request_id),
            approver_id: Set(approver_id),
            approval_level: Set(approval_level),
            is_approved: Set(is_approved),
            comments: Set(comments),
            created_at: Set(Utc::now().into()),
        };

        approval
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }
}
