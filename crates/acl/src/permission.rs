use std::fmt;

use bitflags::bitflags;

use crate::error::{AccessError, Result};

bitflags! {
  /// The three permission bits the entire system turns on.
  ///
  /// - `VISIT`: on a leaf, permission to read its state; on an interior
  ///   node, permission to see its children.
  /// - `MODIFY`: on a leaf, permission to change its content; on an
  ///   interior node, permission to change children's ACLs.
  /// - `AVAILABLE`: on a leaf, the resource is usable; on an interior
  ///   node, children are usable by default.
  #[derive(serde::Serialize, serde::Deserialize)]
  pub struct Permission: u8 {
    const AVAILABLE = 0b001;
    const MODIFY    = 0b010;
    const VISIT     = 0b100;
  }
}

impl Permission {
  /// Renders the three-character `vma`/`-` glyph string, e.g. `v-a`.
  pub fn glyph(&self) -> String {
    let v = if self.contains(Permission::VISIT) { 'v' } else { '-' };
    let m = if self.contains(Permission::MODIFY) { 'm' } else { '-' };
    let a = if self.contains(Permission::AVAILABLE) { 'a' } else { '-' };
    format!("{v}{m}{a}")
  }

  /// Parses a single permission expression: a digit `0`-`7`, `*` (all
  /// bits), or a sequence of `v`/`m`/`a` (with `r`/`w`/`x` aliases) and
  /// `-` (no-op filler, e.g. `v-a`).
  pub fn parse_flags(flags: &str) -> Result<Permission> {
    if flags == "*" {
      return Ok(Permission::all());
    }
    if flags.len() == 1 {
      if let Some(digit) = flags.chars().next().and_then(|c| c.to_digit(8)) {
        if digit <= 7 {
          return Ok(Permission::from_bits_truncate(digit as u8));
        }
      }
    }
    let mut mask = Permission::empty();
    let mut saw_flag = false;
    for c in flags.chars() {
      match c {
        'v' | 'r' => {
          mask |= Permission::VISIT;
          saw_flag = true;
        }
        'm' | 'w' => {
          mask |= Permission::MODIFY;
          saw_flag = true;
        }
        'a' | 'x' => {
          mask |= Permission::AVAILABLE;
          saw_flag = true;
        }
        '-' => {}
        _ => return Err(AccessError::InvalidMaskExpression(flags.to_string())),
      }
    }
    if !saw_flag && flags.is_empty() {
      return Err(AccessError::InvalidMaskExpression(flags.to_string()));
    }
    Ok(mask)
  }

  /// Parses a full chmod-style expression:
  ///
  /// ```text
  /// expr   := [target] [op] flags
  /// target := 'a' (allow, default) | 'd' (deny)
  /// op     := '=' (default) | '+' | '-'
  /// flags  := digit(0-7) | '*' | [vmarwx-]+
  /// ```
  ///
  /// Returns `(mask, op, deny_flag)`.
  pub fn parse(expr: &str) -> Result<(Permission, char, bool)> {
    let mut chars = expr.chars().peekable();

    let deny = match chars.peek() {
      Some('a') => {
        chars.next();
        false
      }
      Some('d') => {
        chars.next();
        true
      }
      _ => false,
    };

    let op = match chars.peek() {
      Some('=') => {
        chars.next();
        '='
      }
      Some('+') => {
        chars.next();
        '+'
      }
      Some('-') if expr.len() > 1 => {
        // A lone leading '-' could be the op or the start of an all-'-' flags
        // run; the op only consumes it when something other than flag chars
        // follows immediately. Flags-only '-' is handled by parse_flags.
        let rest: String = chars.clone().collect();
        if rest.chars().all(|c| matches!(c, '-')) {
          '='
        } else {
          chars.next();
          '-'
        }
      }
      _ => '=',
    };

    let flags: String = chars.collect();
    if flags.is_empty() {
      return Err(AccessError::InvalidMaskExpression(expr.to_string()));
    }
    let mask = Self::parse_flags(&flags)?;
    Ok((mask, op, deny))
  }

  /// Applies a chmod-style op: `=` replaces, `+` unions, `-` clears bits.
  pub fn apply_op(old: Permission, new: Permission, op: char) -> Result<Permission> {
    match op {
      '=' => Ok(new),
      '+' => Ok(old | new),
      '-' => Ok(old & !new),
      other => Err(AccessError::InvalidOp(other.to_string())),
    }
  }
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.glyph())
  }
}
