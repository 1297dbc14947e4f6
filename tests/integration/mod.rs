// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;
pub mod nlp_worker_test;
pub mod ultrasafe_client_test;
pub mod webhook_worker_test;
