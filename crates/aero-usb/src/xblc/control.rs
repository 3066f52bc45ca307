use crate::usb::{ControlResponse, SetupPacket};

use super::{
    UsbXblcDevice, XblcError, XBLC_DESC, XBLC_FEATURE_AGC, XBLC_FEATURE_SAMPLE_RATE,
    XBLC_REQ_SET_FEATURE, XBLC_REQ_TYPE_SET_FEATURE,
};

impl UsbXblcDevice {
    pub(super) fn handle_control(&mut self, setup: SetupPacket) -> ControlResponse {
        if let Some(resp) = self.usb.handle_standard_request(&XBLC_DESC, setup) {
            return resp;
        }

        match self.handle_vendor_request(setup) {
            Ok(()) => ControlResponse::Ack,
            Err(err) => {
                tracing::warn!(
                    index = self.config.index,
                    error = %err,
                    "XBLC: stalling control request"
                );
                ControlResponse::Stall
            }
        }
    }

    fn handle_vendor_request(&mut self, setup: SetupPacket) -> Result<(), XblcError> {
        let unsupported = XblcError::UnsupportedRequest {
            request_type: setup.request_type,
            request: setup.request,
            index: setup.index,
        };
        if setup.request_type != XBLC_REQ_TYPE_SET_FEATURE || setup.request != XBLC_REQ_SET_FEATURE
        {
            return Err(unsupported);
        }

        match setup.index {
            XBLC_FEATURE_SAMPLE_RATE => {
                self.set_sample_rate_index((setup.value & 0xFF) as u8)?;
            }
            XBLC_FEATURE_AGC => self.set_auto_gain_control(setup.value != 0),
            _ => return Err(unsupported),
        }
        Ok(())
    }
}
