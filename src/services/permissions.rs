//! Restriction intent to platform permission mapping.
//!
//! The Bot API renamed part of `ChatPermissions` in 6.5: the single
//! `can_send_media_messages` flag disappeared in favour of per-media flags.
//! Each supported API generation is described by a static
//! [`PermissionSchema`]: the fields it accepts plus alias rules for fields it
//! dropped. Mapping never fails; a schema that cannot express the intent at
//! all yields an empty permission set.

use crate::config::SchemaVersion;
use tracing::warn;
use warden_proto::{ChatPermissions, PermissionField};

/// The eight permission flags a restriction intent is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPermissions {
    pub send_messages: bool,
    pub send_media_messages: bool,
    pub send_polls: bool,
    pub send_other_messages: bool,
    pub add_web_page_previews: bool,
    pub change_info: bool,
    pub invite_users: bool,
    pub pin_messages: bool,
}

impl CanonicalPermissions {
    /// Everything denied.
    pub const FULL_MUTE: Self = Self {
        send_messages: false,
        send_media_messages: false,
        send_polls: false,
        send_other_messages: false,
        add_web_page_previews: false,
        change_info: false,
        invite_users: false,
        pin_messages: false,
    };

    /// Regular member rights; info changes and pinning stay restricted.
    pub const FULL_UNMUTE: Self = Self {
        send_messages: true,
        send_media_messages: true,
        send_polls: true,
        send_other_messages: true,
        add_web_page_previews: true,
        change_info: false,
        invite_users: true,
        pin_messages: false,
    };

    /// `(field, value)` pairs in wire order.
    pub fn flags(&self) -> [(PermissionField, bool); 8] {
        [
            (PermissionField::SendMessages, self.send_messages),
            (PermissionField::SendMediaMessages, self.send_media_messages),
            (PermissionField::SendPolls, self.send_polls),
            (PermissionField::SendOtherMessages, self.send_other_messages),
            (PermissionField::AddWebPagePreviews, self.add_web_page_previews),
            (PermissionField::ChangeInfo, self.change_info),
            (PermissionField::InviteUsers, self.invite_users),
            (PermissionField::PinMessages, self.pin_messages),
        ]
    }
}

/// Fields a Bot API generation accepts, and how to rewrite the ones it does not.
#[derive(Debug, Clone, Copy)]
pub struct PermissionSchema {
    pub name: &'static str,
    pub accepted: &'static [PermissionField],
    /// `(dropped, replacement)`; applied only when `replacement` is accepted.
    pub aliases: &'static [(PermissionField, PermissionField)],
}

impl PermissionSchema {
    pub const LEGACY: Self = Self {
        name: "legacy",
        accepted: &PermissionField::ALL,
        aliases: &[],
    };

    pub const GRANULAR: Self = Self {
        name: "granular",
        accepted: &[
            PermissionField::SendMessages,
            PermissionField::SendPolls,
            PermissionField::SendOtherMessages,
            PermissionField::AddWebPagePreviews,
            PermissionField::ChangeInfo,
            PermissionField::InviteUsers,
            PermissionField::PinMessages,
        ],
        aliases: &[(
            PermissionField::SendMediaMessages,
            PermissionField::SendOtherMessages,
        )],
    };

    pub fn for_version(version: SchemaVersion) -> Self {
        match version {
            SchemaVersion::Legacy => Self::LEGACY,
            SchemaVersion::Granular => Self::GRANULAR,
        }
    }

    fn accepts(&self, field: PermissionField) -> bool {
        self.accepted.contains(&field)
    }

    fn alias_for(&self, field: PermissionField) -> Option<PermissionField> {
        self.aliases
            .iter()
            .find(|(from, _)| *from == field)
            .map(|(_, to)| *to)
    }
}

/// Build the set against the schema's own field names.
fn build_direct(
    flags: &[(PermissionField, bool)],
    schema: &PermissionSchema,
) -> Option<ChatPermissions> {
    let mut perms = ChatPermissions::default();
    for (field, value) in flags {
        if !schema.accepts(*field) {
            return None;
        }
        perms.set(*field, *value);
    }
    Some(perms)
}

/// Rewrite dropped fields through the alias table and retry.
///
/// An alias never overrides a value the intent already gives the replacement
/// field explicitly; the dropped field is discarded in that case.
fn build_aliased(
    flags: &[(PermissionField, bool)],
    schema: &PermissionSchema,
) -> Option<ChatPermissions> {
    let explicit = |target: PermissionField| flags.iter().any(|(f, _)| *f == target);

    let mut rewritten = Vec::with_capacity(flags.len());
    for (field, value) in flags {
        if schema.accepts(*field) {
            rewritten.push((*field, *value));
            continue;
        }
        match schema.alias_for(*field) {
            Some(target) if explicit(target) => {}
            Some(target) => rewritten.push((target, *value)),
            None => return None,
        }
    }
    build_direct(&rewritten, schema)
}

/// Map a restriction intent into the platform's permission representation.
///
/// Tries the canonical names, then the alias table; if neither works the
/// result is an empty set rather than an error so an unrelated schema
/// mismatch never blocks a moderation action.
pub fn map_permissions(intent: &CanonicalPermissions, schema: &PermissionSchema) -> ChatPermissions {
    let flags = intent.flags();

    if let Some(perms) = build_direct(&flags, schema) {
        return perms;
    }
    if let Some(perms) = build_aliased(&flags, schema) {
        return perms;
    }

    warn!(
        schema = schema.name,
        "Permission intent not expressible in schema, sending empty permission set"
    );
    ChatPermissions::default()
}

/// Permissions applied by `/mute`.
pub fn full_mute(schema: &PermissionSchema) -> ChatPermissions {
    map_permissions(&CanonicalPermissions::FULL_MUTE, schema)
}

/// Permissions applied by `/unmute`.
pub fn full_unmute(schema: &PermissionSchema) -> ChatPermissions {
    map_permissions(&CanonicalPermissions::FULL_UNMUTE, schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_covers_every_canonical_field() {
        for schema in [PermissionSchema::LEGACY, PermissionSchema::GRANULAR] {
            for field in PermissionField::ALL {
                let covered = schema.accepts(field)
                    || schema.alias_for(field).is_some_and(|t| schema.accepts(t));
                assert!(covered, "{} cannot express {:?}", schema.name, field);
            }
        }
    }

    #[test]
    fn test_legacy_is_direct() {
        let perms = full_mute(&PermissionSchema::LEGACY);
        for field in PermissionField::ALL {
            assert_eq!(perms.get(field), Some(false));
        }
    }

    #[test]
    fn test_granular_drops_media_flag() {
        let perms = full_unmute(&PermissionSchema::GRANULAR);
        assert_eq!(perms.get(PermissionField::SendMediaMessages), None);
        assert_eq!(perms.get(PermissionField::SendMessages), Some(true));
        assert_eq!(perms.get(PermissionField::SendOtherMessages), Some(true));
        assert_eq!(perms.get(PermissionField::InviteUsers), Some(true));
        assert_eq!(perms.get(PermissionField::ChangeInfo), Some(false));
        assert_eq!(perms.get(PermissionField::PinMessages), Some(false));
    }

    #[test]
    fn test_alias_renames_when_target_not_explicit() {
        let flags = [
            (PermissionField::SendMessages, true),
            (PermissionField::SendMediaMessages, false),
        ];
        let perms = build_aliased(&flags, &PermissionSchema::GRANULAR).unwrap();
        assert_eq!(perms.get(PermissionField::SendOtherMessages), Some(false));
        assert_eq!(perms.get(PermissionField::SendMediaMessages), None);
    }

    #[test]
    fn test_unexpressible_intent_falls_back_to_empty() {
        const BROKEN: PermissionSchema = PermissionSchema {
            name: "broken",
            accepted: &[PermissionField::SendMessages],
            aliases: &[(
                PermissionField::SendMediaMessages,
                PermissionField::SendOtherMessages,
            )],
        };
        let perms = full_mute(&BROKEN);
        assert!(perms.is_empty());
    }

    #[test]
    fn test_unmute_profile() {
        let u = CanonicalPermissions::FULL_UNMUTE;
        assert!(u.send_messages && u.send_media_messages && u.invite_users);
        assert!(!u.change_info && !u.pin_messages);
        assert!(CanonicalPermissions::FULL_MUTE.flags().iter().all(|(_, v)| !v));
    }
}
