// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

pub mod entity;
pub mod query;
pub mod search;
