// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Step handlers of the intake conversation.
//!
//! Every step is matched exhaustively. Invalid input re-prompts and leaves
//! the step unchanged; valid input moves along one of the edges listed by
//! [`Step::allowed_next`]. The next prompt is sent before the new step is
//! stored, so a failed send or write leaves the user where they were.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use atelier_core::AtelierError;
use atelier_core::types::{
    ConversationState, InboundEvent, Keyboard, Material, MessageId, ServiceKind, Step, UserId,
};
use atelier_pricing::{PricingParams, compute_price, money};

use crate::notify::NotificationJob;
use crate::prompts::{self, buttons};
use crate::service::IntakeService;
use crate::validators::{
    DateError, format_date, is_valid_phone, normalize_phone, parse_dimensions,
    parse_manual_date, tomorrow, working_days_between,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl IntakeService {
    pub(crate) async fn on_text(
        &self,
        event: &InboundEvent,
        text: &str,
    ) -> Result<(), AtelierError> {
        let user = event.user_id;
        let state = self.load(user).await?;
        if text == buttons::CANCEL {
            return self.cancel(user, state).await;
        }
        let Some(step) = state.step else {
            debug!(user_id = %user, "text without an active conversation");
            self.send(user, prompts::UNKNOWN, Keyboard::None).await?;
            return Ok(());
        };
        debug!(user_id = %user, %step, "handling step input");

        match step {
            Step::PrivacyAgreement => self.privacy_agreement(event, state, text).await,
            Step::ServiceSelection => self.service_selection(user, state, text).await,
            Step::ServiceType => self.service_type(user, state, text).await,
            Step::CustomTextureInput => self.custom_texture(user, state, text).await,
            Step::Dimensions => self.dimensions(user, state, text).await,
            Step::DateSelection | Step::ManualDateInput => {
                self.date_selection(user, step, state, text).await
            }
            Step::DateConfirmation => self.date_confirmation(user, state, text).await,
            Step::ContactMethod => self.contact_method(user, state, text).await,
            Step::PhoneNumber => self.submit_phone(event, text).await,
        }
    }

    pub(crate) async fn on_contact(
        &self,
        event: &InboundEvent,
        phone: &str,
    ) -> Result<(), AtelierError> {
        let state = self.load(event.user_id).await?;
        match state.step {
            Some(Step::ContactMethod | Step::PhoneNumber) => self.submit_phone(event, phone).await,
            _ => {
                self.send(event.user_id, prompts::UNKNOWN, Keyboard::None)
                    .await?;
                Ok(())
            }
        }
    }

    /// Prompts for `next`, then stores `state` at `next`.
    async fn advance(
        &self,
        user: UserId,
        from: Step,
        mut state: ConversationState,
        next: Step,
        prompt: &str,
        keyboard: Keyboard,
    ) -> Result<(), AtelierError> {
        if !from.may_advance_to(next) {
            return Err(AtelierError::Internal(format!(
                "undefined transition {from} -> {next}"
            )));
        }
        self.send(user, prompt, keyboard).await?;
        state.step = Some(next);
        self.save(user, &state).await?;
        debug!(user_id = %user, %from, %next, "step advanced");
        Ok(())
    }

    /// Explicit cancel. Dimension and texture entry fall back to the service
    /// menu, date steps fall back to dimensions, anything else ends the
    /// conversation.
    pub(crate) async fn cancel(
        &self,
        user: UserId,
        state: ConversationState,
    ) -> Result<(), AtelierError> {
        match state.step {
            Some(step @ (Step::Dimensions | Step::CustomTextureInput)) => {
                let text = if step == Step::Dimensions {
                    prompts::CANCELLED_DIMENSIONS
                } else {
                    prompts::CANCELLED_TEXTURE
                };
                let menu = self.service_menu().await?;
                let state = ConversationState::default();
                self.advance(user, step, state, Step::ServiceType, text, menu)
                    .await
            }
            Some(
                step @ (Step::DateSelection | Step::ManualDateInput | Step::DateConfirmation),
            ) => {
                let state = ConversationState {
                    date: None,
                    ..state
                };
                self.advance(
                    user,
                    step,
                    state,
                    Step::Dimensions,
                    prompts::CANCELLED_DATE,
                    prompts::cancel_keyboard(),
                )
                .await
            }
            _ => {
                self.clear(user).await?;
                info!(user_id = %user, "conversation cancelled");
                self.send(user, prompts::CANCELLED, Keyboard::Remove).await?;
                Ok(())
            }
        }
    }

    async fn privacy_agreement(
        &self,
        event: &InboundEvent,
        state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        let user = event.user_id;
        if text != buttons::CONTINUE {
            self.send(user, prompts::PRESS_CONTINUE, prompts::continue_keyboard())
                .await?;
            return Ok(());
        }
        self.budget.run(self.repo.save_user_agreement(user)).await?;
        info!(user_id = %user, "privacy agreement accepted");
        self.notifications.enqueue(NotificationJob::PrivacyAgreement {
            display_name: event.display_name(),
        });

        self.advance(
            user,
            Step::PrivacyAgreement,
            state,
            Step::ServiceSelection,
            prompts::AGREEMENT_THANKS,
            prompts::place_order_keyboard(),
        )
        .await
    }

    async fn service_selection(
        &self,
        user: UserId,
        state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        if text != buttons::PLACE_ORDER {
            self.send(user, prompts::PRESS_PLACE_ORDER, prompts::place_order_keyboard())
                .await?;
            return Ok(());
        }
        let menu = self.service_menu().await?;
        self.advance(
            user,
            Step::ServiceSelection,
            state,
            Step::ServiceType,
            prompts::CHOOSE_SERVICE,
            menu,
        )
        .await
    }

    async fn service_type(
        &self,
        user: UserId,
        mut state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        if text == buttons::OTHER_TEXTURE {
            state.service_type = Some(ServiceKind::Custom);
            return self
                .advance(
                    user,
                    Step::ServiceType,
                    state,
                    Step::CustomTextureInput,
                    prompts::ENTER_TEXTURE,
                    prompts::back_keyboard(),
                )
                .await;
        }

        let material = self.budget.run(self.repo.get_texture_by_name(text)).await?;
        let Some(material) = material.filter(|m| m.in_stock) else {
            debug!(user_id = %user, input = text, "unknown service choice");
            self.send_service_menu(user, prompts::CHOOSE_OPTION).await?;
            return Ok(());
        };

        state.service = Some(material.name.clone());
        state.service_type = Some(ServiceKind::Catalog);
        state.texture_id = Some(material.id);
        self.advance(
            user,
            Step::ServiceType,
            state,
            Step::Dimensions,
            prompts::ENTER_DIMENSIONS,
            prompts::cancel_keyboard(),
        )
        .await
    }

    async fn custom_texture(
        &self,
        user: UserId,
        mut state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        if text == buttons::BACK {
            let menu = self.service_menu().await?;
            return self
                .advance(
                    user,
                    Step::CustomTextureInput,
                    ConversationState::default(),
                    Step::ServiceType,
                    prompts::CHOOSE_SERVICE,
                    menu,
                )
                .await;
        }
        if text.chars().count() < 3 {
            self.send(user, prompts::TEXTURE_TOO_SHORT, prompts::back_keyboard())
                .await?;
            return Ok(());
        }

        state.service = Some(text.to_string());
        state.service_type = Some(ServiceKind::Custom);
        state.texture_id = None;
        self.advance(
            user,
            Step::CustomTextureInput,
            state,
            Step::Dimensions,
            prompts::ENTER_DIMENSIONS,
            prompts::cancel_keyboard(),
        )
        .await
    }

    async fn dimensions(
        &self,
        user: UserId,
        mut state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        let (width, height) = match parse_dimensions(text) {
            Ok(dims) => dims,
            Err(e) => {
                debug!(user_id = %user, input = text, reason = %e, "dimensions rejected");
                self.send(user, e.user_message(), Keyboard::None).await?;
                return Ok(());
            }
        };
        state.width_cm = Some(width);
        state.height_cm = Some(height);

        if let Some(material) = self.selected_material(&state).await? {
            let price = self.quote(width, height, &material)?;
            let prompt = prompts::quote(width, height, &material.name, &price);
            state.price = Some(price);
            return self
                .advance(
                    user,
                    Step::Dimensions,
                    state,
                    Step::DateSelection,
                    &prompt,
                    prompts::date_keyboard(),
                )
                .await;
        }

        // Custom branch: stay here until a catalog material is picked.
        let materials = self.budget.run(self.repo.list_textures()).await?;
        let mut quotes = Vec::with_capacity(materials.len());
        for material in materials {
            let params = PricingParams::new(&self.pricing, material.price_per_dm2);
            match compute_price(width, height, &params) {
                Ok(b) => quotes.push((material, b.final_price)),
                Err(e) => warn!(texture_id = %material.id, error = %e, "cannot quote material"),
            }
        }
        let default_rate = PricingParams::with_default_material(&self.pricing);
        let estimate = match compute_price(width, height, &default_rate) {
            Ok(b) => Some(money(b.final_price)),
            Err(e) => {
                warn!(error = %e, "cannot estimate custom material");
                None
            }
        };
        let prompt = prompts::pick_material(
            state.service.as_deref().unwrap_or_default(),
            width,
            height,
            estimate.as_deref(),
        );
        self.send(user, &prompt, prompts::material_picker(&quotes))
            .await?;
        self.save(user, &state).await
    }

    /// `texture:<id>` callback from the material picker.
    pub(crate) async fn select_texture(
        &self,
        user: UserId,
        texture_id: &str,
        message_id: Option<MessageId>,
    ) -> Result<(), AtelierError> {
        let mut state = self.load(user).await?;
        let dims = state.width_cm.zip(state.height_cm);
        let material = match (state.step, dims) {
            (Some(Step::Dimensions), Some(_)) => {
                self.budget
                    .run(self.repo.get_texture_by_id(texture_id))
                    .await?
            }
            _ => None,
        };
        let (Some(material), Some((width, height))) = (material, dims) else {
            self.send(user, prompts::STALE_CHOICE, Keyboard::None).await?;
            return Ok(());
        };

        let price = self.quote(width, height, &material)?;
        let prompt = prompts::material_chosen(&material.name, &price);
        state.texture_id = Some(material.id.clone());
        state.price = Some(price);
        self.advance(
            user,
            Step::Dimensions,
            state,
            Step::DateSelection,
            &prompt,
            prompts::date_keyboard(),
        )
        .await?;
        info!(user_id = %user, texture_id = %material.id, "material picked");

        if let Some(message) = message_id
            && let Err(e) = self
                .budget
                .run(self.gateway.delete_message(user.into(), message))
                .await
        {
            warn!(user_id = %user, error = %e, "failed to delete material picker");
        }
        Ok(())
    }

    async fn date_selection(
        &self,
        user: UserId,
        step: Step,
        state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        let today = today();
        let date = match text {
            buttons::TODAY => today,
            buttons::TOMORROW => tomorrow(today),
            buttons::MANUAL_DATE => {
                return self
                    .advance(
                        user,
                        step,
                        state,
                        Step::ManualDateInput,
                        prompts::ENTER_DATE,
                        prompts::cancel_keyboard(),
                    )
                    .await;
            }
            other => match parse_manual_date(other, today) {
                Ok(date) => date,
                Err(DateError::Format) if step == Step::DateSelection => {
                    self.send(user, prompts::CHOOSE_OPTION, prompts::date_keyboard())
                        .await?;
                    return Ok(());
                }
                Err(e) => {
                    debug!(user_id = %user, input = other, reason = %e, "date rejected");
                    self.send(user, e.user_message(), Keyboard::None).await?;
                    return Ok(());
                }
            },
        };

        let formatted = format_date(date);
        let prompt = prompts::date_chosen(&formatted, working_days_between(today, date));
        let state = ConversationState {
            date: Some(formatted),
            ..state
        };
        self.advance(
            user,
            step,
            state,
            Step::DateConfirmation,
            &prompt,
            prompts::date_confirmation_keyboard(),
        )
        .await
    }

    async fn date_confirmation(
        &self,
        user: UserId,
        state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        match text {
            buttons::CONFIRM_DATE => {
                self.advance(
                    user,
                    Step::DateConfirmation,
                    state,
                    Step::ContactMethod,
                    prompts::ASK_CONTACT_METHOD,
                    prompts::contact_method_keyboard(),
                )
                .await
            }
            buttons::CHANGE_DATE => {
                let state = ConversationState { date: None, ..state };
                self.advance(
                    user,
                    Step::DateConfirmation,
                    state,
                    Step::DateSelection,
                    prompts::ASK_DATE,
                    prompts::date_keyboard(),
                )
                .await
            }
            _ => self
                .send(user, prompts::USE_BUTTONS, prompts::date_confirmation_keyboard())
                .await
                .map(drop),
        }
    }

    async fn contact_method(
        &self,
        user: UserId,
        state: ConversationState,
        text: &str,
    ) -> Result<(), AtelierError> {
        match text {
            buttons::SEND_CONTACT => self
                .send(user, prompts::PRESS_SHARE_CONTACT, prompts::share_contact_keyboard())
                .await
                .map(drop),
            buttons::ENTER_MANUALLY => {
                self.advance(
                    user,
                    Step::ContactMethod,
                    state,
                    Step::PhoneNumber,
                    prompts::ENTER_PHONE,
                    prompts::cancel_keyboard(),
                )
                .await
            }
            buttons::BACK => {
                let state = ConversationState { date: None, ..state };
                self.advance(
                    user,
                    Step::ContactMethod,
                    state,
                    Step::DateSelection,
                    prompts::ASK_DATE,
                    prompts::date_keyboard(),
                )
                .await
            }
            _ => self
                .send(user, prompts::CHOOSE_OPTION, prompts::contact_method_keyboard())
                .await
                .map(drop),
        }
    }

    /// Terminal step: a valid phone creates the order.
    async fn submit_phone(&self, event: &InboundEvent, raw: &str) -> Result<(), AtelierError> {
        let user = event.user_id;
        let phone = normalize_phone(raw);
        if !is_valid_phone(&phone) {
            debug!(user_id = %user, "phone rejected");
            self.send(user, prompts::INVALID_PHONE, Keyboard::None).await?;
            return Ok(());
        }

        if let Err(e) = self
            .create_order(user, &phone, &event.display_name())
            .await
        {
            e.log(user);
            self.send(user, e.user_message(), Keyboard::None).await?;
        }
        Ok(())
    }

    /// Catalog material recorded in the state, if any.
    async fn selected_material(
        &self,
        state: &ConversationState,
    ) -> Result<Option<Material>, AtelierError> {
        match &state.texture_id {
            Some(id) => self.budget.run(self.repo.get_texture_by_id(id)).await,
            None => Ok(None),
        }
    }

    /// Final price for display.
    fn quote(&self, width: u32, height: u32, material: &Material) -> Result<String, AtelierError> {
        let params = PricingParams::new(&self.pricing, material.price_per_dm2);
        let breakdown = compute_price(width, height, &params)
            .map_err(|e| AtelierError::Internal(format!("pricing failed: {e}")))?;
        Ok(money(breakdown.final_price))
    }
}
