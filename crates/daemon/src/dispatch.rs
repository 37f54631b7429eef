// SPDX-License-Identifier: MIT

//! Request dispatch: identity gate, authorization gate, ownership
//! enforcement, then the operation itself.

use crate::kernel::Kernel;
use crate::VERSION;
use aether_auth::signature;
use aether_core::{Clock, ErrorCode, Event, KernelError, User};
use aether_engine::audit;
use aether_wire::{Envelope, Request, RequestFrame};
use serde_json::json;
use tracing::debug;

/// What the listener should do with the connection after a request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Write the envelope and keep reading requests.
    Respond(Envelope),
    /// Write nothing; switch the connection to an SSE event stream.
    Stream { filters: String },
    /// Write the envelope, then begin daemon shutdown.
    Shutdown(Envelope),
}

/// Run one request through both gates and its handler.
pub fn dispatch<C: Clock + 'static>(kernel: &Kernel<C>, frame: &RequestFrame) -> DispatchOutcome {
    if frame.request.is_anonymous() {
        return DispatchOutcome::Respond(handle_anonymous(kernel, &frame.request));
    }

    // Gate 1: identity.
    let Some(token) = frame.token.as_deref() else {
        return DispatchOutcome::Respond(Envelope::error(
            ErrorCode::Unauthorized,
            "missing bearer token",
        ));
    };
    let Some((user, _claims)) = kernel.auth.validate_token(token) else {
        return DispatchOutcome::Respond(Envelope::error(
            ErrorCode::Unauthorized,
            "invalid or expired token",
        ));
    };

    // Gate 2: authorization (layer B policy engine).
    if let Some((action, resource)) = frame.request.required_permission() {
        if !kernel.auth.check_permission(user.id.as_str(), &action, &resource) {
            debug!(user = %user.username, action, resource, "request denied by policy");
            return DispatchOutcome::Respond(Envelope::error(
                ErrorCode::Forbidden,
                format!("denied: {action} on {resource}"),
            ));
        }
    }

    // Ownership for process-scoped operations: owner, admin, or an org
    // membership whose role grants agent management. The empty-deployment
    // convenience of layer A does not apply here; ownership is not a
    // permission.
    if let Some(pid) = frame.request.owned_pid() {
        let org_grant = kernel
            .auth
            .orgs_of_user(user.id.as_str())
            .iter()
            .any(|(_, m)| aether_auth::role_permissions(m.role).contains(&"agents.manage"));
        let allowed =
            kernel.table.is_owner(pid, user.id.as_str(), user.is_admin()) || org_grant;
        if !allowed {
            return DispatchOutcome::Respond(Envelope::error(
                ErrorCode::Forbidden,
                format!("pid {pid} is not owned by {}", user.username),
            ));
        }
    }

    match &frame.request {
        Request::Subscribe { filters } => DispatchOutcome::Stream { filters: filters.clone() },
        Request::Shutdown => DispatchOutcome::Shutdown(Envelope::ok()),
        request => DispatchOutcome::Respond(handle(kernel, &user, request)),
    }
}

fn handle_anonymous<C: Clock + 'static>(kernel: &Kernel<C>, request: &Request) -> Envelope {
    match request {
        Request::Ping => Envelope::data(&json!({ "pong": true })),
        Request::Hello { version } => {
            debug!(client = %version, "hello");
            Envelope::data(&json!({ "version": VERSION }))
        }
        Request::Register { username, password, display_name } => {
            result(kernel.auth.register(username, password, display_name))
        }
        Request::Authenticate { username, password } => {
            result(kernel.auth.authenticate(username, password))
        }
        Request::AuthenticateMfa { mfa_token, code } => {
            result(kernel.auth.authenticate_mfa(mfa_token, code))
        }
        Request::SlackWebhook { timestamp, signature: presented, body } => {
            handle_webhook(kernel, timestamp, presented, body)
        }
        // dispatch() routes only anonymous requests here.
        _ => Envelope::error(ErrorCode::InvalidInput, "request requires authentication"),
    }
}

fn handle<C: Clock + 'static>(kernel: &Kernel<C>, user: &User, request: &Request) -> Envelope {
    match request {
        // -- identity --
        Request::MfaSetup => result(kernel.auth.setup_mfa(user.id.as_str())),
        Request::MfaEnable { code } => match kernel.auth.enable_mfa(user.id.as_str(), code) {
            Ok(true) => Envelope::data(&json!({ "enabled": true })),
            Ok(false) => Envelope::error(ErrorCode::InvalidInput, "code did not verify"),
            Err(err) => err.into(),
        },
        Request::MfaDisable => result(kernel.auth.disable_mfa(user.id.as_str()).map(|()| json!({ "enabled": false }))),
        Request::UserList => {
            if !user.is_admin() {
                return Envelope::error(ErrorCode::Forbidden, "admin only");
            }
            let users = kernel.auth.list_users();
            Envelope::list(&users, users.len(), users.len(), 0)
        }
        Request::UserDelete { id } => {
            if !user.is_admin() {
                return Envelope::error(ErrorCode::Forbidden, "admin only");
            }
            result(kernel.auth.delete_user(id))
        }

        // -- org graph --
        Request::OrgCreate { name, display_name } => {
            result(kernel.auth.create_org(user, name, display_name))
        }
        Request::OrgDelete { id } => {
            result(kernel.auth.delete_org(user, id).map(|()| json!({ "deleted": id })))
        }
        Request::OrgList => {
            let orgs: Vec<_> = if user.is_admin() {
                kernel.auth.list_orgs()
            } else {
                kernel.auth.orgs_of_user(user.id.as_str()).into_iter().map(|(o, _)| o).collect()
            };
            Envelope::list(&orgs, orgs.len(), orgs.len(), 0)
        }
        Request::MemberInvite { org_id, user_id, role } => {
            result(kernel.auth.invite_member(user, org_id, user_id, *role))
        }
        Request::MemberUpdate { org_id, user_id, role } => {
            result(kernel.auth.update_member_role(user, org_id, user_id, *role))
        }
        Request::MemberRemove { org_id, user_id } => result(
            kernel
                .auth
                .remove_member(user, org_id, user_id)
                .map(|()| json!({ "removed": user_id })),
        ),
        Request::TeamCreate { org_id, name, description } => {
            result(kernel.auth.create_team(user, org_id, name, description))
        }
        Request::TeamMemberAdd { team_id, user_id, role } => {
            result(kernel.auth.add_team_member(user, team_id, user_id, *role))
        }

        // -- policies --
        Request::PolicyGrant { subject, action, resource, effect } => result(
            kernel.auth.grant_policy(Some(user.id), subject, action, resource, *effect),
        ),
        Request::PolicyRevoke { id } => result(kernel.auth.revoke_policy(id)),
        Request::PolicyList => {
            let policies = kernel.auth.list_policies();
            Envelope::list(&policies, policies.len(), policies.len(), 0)
        }
        Request::PermissionCheck { action, resource } => {
            let decision = kernel.auth.evaluate_permission(user.id.as_str(), action, resource);
            Envelope::data(&json!({
                "allowed": decision.allowed,
                "rule_id": decision.rule_id,
            }))
        }

        // -- processes --
        Request::Spawn { config, ppid } => {
            result(kernel.table.spawn(config.clone(), *ppid, user.id.as_str()))
        }
        Request::SignalSend { pid, signal } => result(
            kernel.table.signal(*pid, *signal).map(|()| json!({ "pid": pid, "signal": signal })),
        ),
        Request::SetState { pid, state, phase } => {
            result(kernel.table.set_state(*pid, *state, phase.as_deref()))
        }
        Request::SetPriority { pid, priority } => {
            let Ok(priority) = u8::try_from(*priority) else {
                return Envelope::error(ErrorCode::InvalidInput, "priority must be 1..=5");
            };
            result(
                kernel
                    .table
                    .set_priority(*pid, priority)
                    .map(|()| json!({ "pid": pid, "priority": priority })),
            )
        }
        Request::Reap { pid } => result(kernel.table.reap(*pid).map(|(reaped, admitted)| {
            json!({ "reaped": reaped, "admitted": admitted })
        })),
        Request::MessageSend { from_pid, to_pid, channel, payload } => {
            // The sender process must belong to the caller.
            if !kernel.table.is_owner(*from_pid, user.id.as_str(), user.is_admin()) {
                return Envelope::error(
                    ErrorCode::Forbidden,
                    format!("pid {from_pid} is not owned by {}", user.username),
                );
            }
            result(kernel.table.send_message(*from_pid, *to_pid, channel, payload.clone()))
        }
        Request::MessageDrain { pid } => result(kernel.table.drain_messages(*pid)),
        Request::ProcessList { all } => {
            let mut processes =
                if *all { kernel.table.list_all() } else { kernel.table.list_live() };
            if !user.is_admin() {
                processes.retain(|p| p.owner_uid == user.id.as_str());
            }
            Envelope::list(&processes, processes.len(), processes.len(), 0)
        }
        Request::ProcessGet { pid } => match kernel.table.get(*pid) {
            Some(process) => Envelope::data(&process),
            None => Envelope::error(ErrorCode::NotFound, format!("no such pid {pid}")),
        },
        Request::ProcessCounts => Envelope::data(&kernel.table.counts()),
        Request::AgentEmit { pid, stream, content, detail } => {
            match kernel.table.get(*pid) {
                Some(process) if process.state.is_live() => {}
                Some(_) => {
                    return Envelope::error(ErrorCode::InvalidState, format!("pid {pid} is dead"))
                }
                None => {
                    return Envelope::error(ErrorCode::NotFound, format!("no such pid {pid}"))
                }
            }
            let event = match stream {
                aether_core::AgentStream::Thought => {
                    Event::AgentThought { pid: *pid, content: content.clone() }
                }
                aether_core::AgentStream::Action => Event::AgentAction {
                    pid: *pid,
                    action: content.clone(),
                    detail: detail.clone(),
                },
                aether_core::AgentStream::Observation => {
                    Event::AgentObservation { pid: *pid, content: content.clone() }
                }
            };
            kernel.bus.emit(&event);
            Envelope::ok()
        }

        // -- plans --
        Request::PlanSet { pid, goal, nodes } => {
            if kernel.table.get(*pid).is_none() {
                return Envelope::error(ErrorCode::NotFound, format!("no such pid {pid}"));
            }
            result(kernel.plans.set_plan(*pid, goal, nodes.clone()))
        }
        Request::PlanGet { pid } => match kernel.plans.get_plan(*pid) {
            Some(plan) => Envelope::data(&plan),
            None => Envelope::error(ErrorCode::NotFound, format!("no plan for pid {pid}")),
        },

        // -- scheduler --
        Request::CronCreate { name, cron_expr, agent_config } => result(
            kernel.scheduler.create_cron(user.id.as_str(), name, cron_expr, agent_config.clone()),
        ),
        Request::CronList => {
            let crons = owned_only(kernel.scheduler.list_crons(), user, |c| &c.owner_uid);
            Envelope::list(&crons, crons.len(), crons.len(), 0)
        }
        Request::CronSetEnabled { id, enabled } => {
            match schedule_owner_gate(kernel.scheduler.list_crons(), id, user, |c| {
                (c.id.to_string(), c.owner_uid.clone())
            }) {
                Some(envelope) => envelope,
                None => result(kernel.scheduler.set_cron_enabled(id, *enabled)),
            }
        }
        Request::CronDelete { id } => {
            match schedule_owner_gate(kernel.scheduler.list_crons(), id, user, |c| {
                (c.id.to_string(), c.owner_uid.clone())
            }) {
                Some(envelope) => envelope,
                None => result(kernel.scheduler.delete_cron(id)),
            }
        }
        Request::TriggerCreate { name, event_pattern, filter, cooldown_ms, agent_config } => {
            result(kernel.scheduler.create_trigger(
                user.id.as_str(),
                name,
                event_pattern,
                filter.clone(),
                *cooldown_ms,
                agent_config.clone(),
            ))
        }
        Request::TriggerList => {
            let triggers = owned_only(kernel.scheduler.list_triggers(), user, |t| &t.owner_uid);
            Envelope::list(&triggers, triggers.len(), triggers.len(), 0)
        }
        Request::TriggerSetEnabled { id, enabled } => {
            match schedule_owner_gate(kernel.scheduler.list_triggers(), id, user, |t| {
                (t.id.to_string(), t.owner_uid.clone())
            }) {
                Some(envelope) => envelope,
                None => result(kernel.scheduler.set_trigger_enabled(id, *enabled)),
            }
        }
        Request::TriggerDelete { id } => {
            match schedule_owner_gate(kernel.scheduler.list_triggers(), id, user, |t| {
                (t.id.to_string(), t.owner_uid.clone())
            }) {
                Some(envelope) => envelope,
                None => result(kernel.scheduler.delete_trigger(id)),
            }
        }

        // -- audit --
        Request::Audit { query } => {
            let (entries, total) = audit::query(&kernel.store, query);
            let limit = query.limit.unwrap_or(100);
            let offset = query.offset.unwrap_or(0);
            Envelope::list(&entries, total, limit, offset)
        }

        // Handled in dispatch() before reaching here.
        Request::Subscribe { .. } | Request::Shutdown => {
            Envelope::error(ErrorCode::InvalidInput, "unreachable request")
        }
        Request::Ping
        | Request::Hello { .. }
        | Request::Register { .. }
        | Request::Authenticate { .. }
        | Request::AuthenticateMfa { .. }
        | Request::SlackWebhook { .. } => handle_anonymous(kernel, request),
    }
}

fn handle_webhook<C: Clock + 'static>(
    kernel: &Kernel<C>,
    timestamp: &str,
    presented: &str,
    body: &str,
) -> Envelope {
    let Some(secret) = kernel.slack_signing_secret.as_deref() else {
        return Envelope::error(ErrorCode::InvalidSignature, "no signing secret configured");
    };
    if !signature::verify_slack_signature(secret, timestamp, body, presented) {
        return Envelope::error(ErrorCode::InvalidSignature, "signature mismatch");
    }
    if let Some(challenge) = signature::challenge_response(body) {
        return Envelope::data(&challenge);
    }
    let payload: serde_json::Value =
        serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    kernel.bus.emit(&Event::Custom { subject: "slack.event".to_string(), payload });
    Envelope::ok()
}

/// Non-admins see only their own scheduler entries.
fn owned_only<T>(items: Vec<T>, user: &User, owner: impl Fn(&T) -> &String) -> Vec<T> {
    if user.is_admin() {
        items
    } else {
        items.into_iter().filter(|item| owner(item) == user.id.as_str()).collect()
    }
}

/// Ownership gate for cron/trigger mutations: `Some(error)` when the
/// entry exists but belongs to someone else.
fn schedule_owner_gate<T>(
    items: Vec<T>,
    id: &str,
    user: &User,
    key: impl Fn(&T) -> (String, String),
) -> Option<Envelope> {
    if user.is_admin() {
        return None;
    }
    for item in items {
        let (item_id, owner_uid) = key(&item);
        if item_id == id && owner_uid != user.id.as_str() {
            return Some(Envelope::error(
                ErrorCode::Forbidden,
                format!("{id} is not owned by {}", user.username),
            ));
        }
    }
    None
}

fn result<T: serde::Serialize>(outcome: Result<T, KernelError>) -> Envelope {
    match outcome {
        Ok(value) => Envelope::data(&value),
        Err(err) => err.into(),
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
